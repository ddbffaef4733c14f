// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera simulator.
//!
//! Models the exposure pipeline only: `startexposure` opens a timed
//! exposure, the tick moves it to readout and then back to idle with an
//! image ready. No pixel data is produced.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use super::{Call, Driver, ReadAll};
use crate::command::CommandEntry;
use crate::error::DeviceError;
use crate::state::{CameraState, Transition};
use crate::types::{Access, DeviceType, Method};

/// Tick delay while an exposure is in progress.
pub const BUSY_TICK: Duration = Duration::from_millis(50);

/// Tick delay while idle.
pub const IDLE_TICK: Duration = Duration::from_secs(2);

/// FITS-style timestamp used by `lastexposurestarttime`.
const START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Static characteristics of a simulated camera.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CameraSettings {
    /// Sensor model.
    pub sensor_name: String,
    /// Width in unbinned pixels.
    pub x_size: u32,
    /// Height in unbinned pixels.
    pub y_size: u32,
    /// Highest binning on either axis.
    pub max_bin: u32,
    /// Shortest exposure in seconds.
    pub exposure_min: f64,
    /// Longest exposure in seconds.
    pub exposure_max: f64,
    /// Lowest gain.
    pub gain_min: i32,
    /// Highest gain.
    pub gain_max: i32,
    /// Sensor readout time in seconds.
    pub readout_secs: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            sensor_name: "Simulated CMOS".to_string(),
            x_size: 4144,
            y_size: 2822,
            max_bin: 4,
            exposure_min: 0.001,
            exposure_max: 3600.0,
            gain_min: 0,
            gain_max: 500,
            readout_secs: 1.0,
        }
    }
}

/// Identifiers of the camera commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraCommand {
    AbortExposure,
    BinX,
    BinY,
    CameraState,
    CameraXSize,
    CameraYSize,
    CanAbortExposure,
    CanStopExposure,
    ExposureMax,
    ExposureMin,
    Gain,
    GainMax,
    GainMin,
    ImageReady,
    LastExposureDuration,
    LastExposureStartTime,
    MaxBinX,
    MaxBinY,
    PercentCompleted,
    SensorName,
    StartExposure,
    StopExposure,
}

const COMMANDS: &[CommandEntry<CameraCommand>] = &[
    CommandEntry::new("abortexposure", CameraCommand::AbortExposure, Access::Put),
    CommandEntry::new("binx", CameraCommand::BinX, Access::Both),
    CommandEntry::new("biny", CameraCommand::BinY, Access::Both),
    CommandEntry::new("camerastate", CameraCommand::CameraState, Access::Get),
    CommandEntry::new("cameraxsize", CameraCommand::CameraXSize, Access::Get),
    CommandEntry::new("cameraysize", CameraCommand::CameraYSize, Access::Get),
    CommandEntry::new("canabortexposure", CameraCommand::CanAbortExposure, Access::Get),
    CommandEntry::new("canstopexposure", CameraCommand::CanStopExposure, Access::Get),
    CommandEntry::new("exposuremax", CameraCommand::ExposureMax, Access::Get),
    CommandEntry::new("exposuremin", CameraCommand::ExposureMin, Access::Get),
    CommandEntry::new("gain", CameraCommand::Gain, Access::Both),
    CommandEntry::new("gainmax", CameraCommand::GainMax, Access::Get),
    CommandEntry::new("gainmin", CameraCommand::GainMin, Access::Get),
    CommandEntry::new("imageready", CameraCommand::ImageReady, Access::Get),
    CommandEntry::new("lastexposureduration", CameraCommand::LastExposureDuration, Access::Get),
    CommandEntry::new("lastexposurestarttime", CameraCommand::LastExposureStartTime, Access::Get),
    CommandEntry::new("maxbinx", CameraCommand::MaxBinX, Access::Get),
    CommandEntry::new("maxbiny", CameraCommand::MaxBinY, Access::Get),
    CommandEntry::new("percentcompleted", CameraCommand::PercentCompleted, Access::Get),
    CommandEntry::new("sensorname", CameraCommand::SensorName, Access::Get),
    CommandEntry::new("startexposure", CameraCommand::StartExposure, Access::Put),
    CommandEntry::new("stopexposure", CameraCommand::StopExposure, Access::Put),
];

#[derive(Debug, Clone, Copy)]
struct LastExposure {
    duration: f64,
    started: DateTime<Utc>,
}

/// A simulated camera.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    settings: CameraSettings,
    state: CameraState,
    phase: Option<Transition<CameraState>>,
    image_ready: bool,
    light: bool,
    bin_x: u32,
    bin_y: u32,
    gain: i32,
    last: Option<LastExposure>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(CameraSettings::default())
    }
}

impl SimulatedCamera {
    /// Creates an idle camera, unbinned, at minimum gain.
    #[must_use]
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            state: CameraState::Idle,
            phase: None,
            image_ready: false,
            light: true,
            bin_x: 1,
            bin_y: 1,
            gain: settings.gain_min,
            last: None,
            settings,
        }
    }

    /// Pipeline state.
    #[must_use]
    pub const fn state(&self) -> CameraState {
        self.state
    }

    /// Whether an image is waiting to be read.
    #[must_use]
    pub const fn image_ready(&self) -> bool {
        self.image_ready
    }

    /// Whether the last exposure was a light frame.
    #[must_use]
    pub const fn is_light_frame(&self) -> bool {
        self.light
    }

    fn readout(&self) -> Duration {
        Duration::try_from_secs_f64(self.settings.readout_secs).unwrap_or_default()
    }

    fn require_idle(&self) -> Result<(), DeviceError> {
        if self.state.is_busy() {
            Err(DeviceError::invalid_operation(format!(
                "Camera is busy ({})",
                self.state
            )))
        } else {
            Ok(())
        }
    }

    fn requested_bin(&self, call: &Call<'_>, key: &str) -> Result<u32, DeviceError> {
        self.require_idle()?;
        let requested = call.params().integer(key)?;
        u32::try_from(requested)
            .ok()
            .filter(|bin| (1..=self.settings.max_bin).contains(bin))
            .ok_or_else(|| {
                DeviceError::invalid_value(format!(
                    "{key} {requested} out of range 1..={}",
                    self.settings.max_bin
                ))
            })
    }

    fn set_gain(&mut self, call: &Call<'_>) -> Result<(), DeviceError> {
        let requested = call.params().integer("Gain")?;
        self.gain = i32::try_from(requested)
            .ok()
            .filter(|g| (self.settings.gain_min..=self.settings.gain_max).contains(g))
            .ok_or_else(|| {
                DeviceError::invalid_value(format!(
                    "Gain {requested} out of range {}..={}",
                    self.settings.gain_min, self.settings.gain_max
                ))
            })?;
        Ok(())
    }

    fn start_exposure(&mut self, call: &Call<'_>) -> Result<(), DeviceError> {
        let seconds = call.params().number("Duration")?;
        let light = call.params().boolean("Light")?;
        self.require_idle()?;
        if !(self.settings.exposure_min..=self.settings.exposure_max).contains(&seconds) {
            return Err(DeviceError::invalid_value(format!(
                "Duration {seconds} out of range {}..={}",
                self.settings.exposure_min, self.settings.exposure_max
            )));
        }
        let duration = Duration::try_from_secs_f64(seconds)
            .map_err(|err| DeviceError::invalid_value(format!("Duration {seconds}: {err}")))?;

        self.state = CameraState::Exposing;
        self.phase = Some(Transition::new(CameraState::Reading, call.now(), duration));
        self.image_ready = false;
        self.light = light;
        self.last = Some(LastExposure {
            duration: seconds,
            started: Utc::now(),
        });
        tracing::debug!(seconds, light, "Exposure started");
        Ok(())
    }

    fn abort(&mut self) {
        if self.state.is_busy() {
            self.state = CameraState::Idle;
            self.phase = None;
            self.image_ready = false;
            tracing::debug!("Exposure aborted");
        }
    }

    fn stop(&mut self, now: Instant) {
        if self.state != CameraState::Exposing {
            return;
        }
        if let (Some(phase), Some(last)) = (self.phase, self.last.as_mut()) {
            last.duration = phase.elapsed(now).as_secs_f64();
        }
        self.begin_readout(now);
        tracing::debug!("Exposure stopped early");
    }

    fn begin_readout(&mut self, now: Instant) {
        self.state = CameraState::Reading;
        self.phase = Some(Transition::new(CameraState::Idle, now, self.readout()));
    }

    fn percent_completed(&self, now: Instant) -> f64 {
        match (self.state, self.phase) {
            (CameraState::Exposing, Some(phase)) => (phase.progress(now) * 100.0).floor(),
            (CameraState::Idle, _) if !self.image_ready => 0.0,
            _ => 100.0,
        }
    }

    fn last_exposure(&self) -> Result<LastExposure, DeviceError> {
        self.last
            .ok_or_else(|| DeviceError::value_not_set("No exposure has been taken"))
    }
}

impl Driver for SimulatedCamera {
    type Command = CameraCommand;

    const DEVICE_TYPE: DeviceType = DeviceType::Camera;
    const COMMANDS: &'static [CommandEntry<CameraCommand>] = COMMANDS;
    const INTERFACE_VERSION: i32 = 3;
    const DRIVER_INFO: &'static str = "alpaca-hub simulated camera";

    fn handle(&mut self, command: CameraCommand, call: &mut Call<'_>) -> Result<(), DeviceError> {
        match command {
            CameraCommand::AbortExposure => self.abort(),
            CameraCommand::BinX => match call.method() {
                Method::Get => call.reply(self.bin_x),
                Method::Put => self.bin_x = self.requested_bin(call, "BinX")?,
            },
            CameraCommand::BinY => match call.method() {
                Method::Get => call.reply(self.bin_y),
                Method::Put => self.bin_y = self.requested_bin(call, "BinY")?,
            },
            CameraCommand::CameraState => call.reply(self.state.code()),
            CameraCommand::CameraXSize => call.reply(self.settings.x_size),
            CameraCommand::CameraYSize => call.reply(self.settings.y_size),
            CameraCommand::CanAbortExposure | CameraCommand::CanStopExposure => call.reply(true),
            CameraCommand::ExposureMax => call.reply(self.settings.exposure_max),
            CameraCommand::ExposureMin => call.reply(self.settings.exposure_min),
            CameraCommand::Gain => match call.method() {
                Method::Get => call.reply(self.gain),
                Method::Put => self.set_gain(call)?,
            },
            CameraCommand::GainMax => call.reply(self.settings.gain_max),
            CameraCommand::GainMin => call.reply(self.settings.gain_min),
            CameraCommand::ImageReady => call.reply(self.image_ready),
            CameraCommand::LastExposureDuration => call.reply(self.last_exposure()?.duration),
            CameraCommand::LastExposureStartTime => {
                let started = self.last_exposure()?.started;
                call.reply(started.format(START_TIME_FORMAT).to_string());
            }
            CameraCommand::MaxBinX | CameraCommand::MaxBinY => call.reply(self.settings.max_bin),
            CameraCommand::PercentCompleted => {
                let percent = self.percent_completed(call.now());
                call.reply(percent);
            }
            CameraCommand::SensorName => call.reply(self.settings.sensor_name.as_str()),
            CameraCommand::StartExposure => self.start_exposure(call)?,
            CameraCommand::StopExposure => self.stop(call.now()),
        }
        Ok(())
    }

    fn read_all(&self, fields: &mut ReadAll<'_>) {
        fields.add("binx", self.bin_x);
        fields.add("biny", self.bin_y);
        fields.add("camerastate", self.state.code());
        fields.add("camerastate-str", self.state.as_str());
        fields.add("cameraxsize", self.settings.x_size);
        fields.add("cameraysize", self.settings.y_size);
        fields.add("canabortexposure", true);
        fields.add("canstopexposure", true);
        fields.add("exposuremax", self.settings.exposure_max);
        fields.add("exposuremin", self.settings.exposure_min);
        fields.add("gain", self.gain);
        fields.add("gainmax", self.settings.gain_max);
        fields.add("gainmin", self.settings.gain_min);
        fields.add("imageready", self.image_ready);
        fields.add("maxbinx", self.settings.max_bin);
        fields.add("maxbiny", self.settings.max_bin);
        fields.add("sensorname", self.settings.sensor_name.as_str());
        if let Some(last) = self.last {
            fields.add("lastexposureduration", last.duration);
            fields.add(
                "lastexposurestarttime",
                last.started.format(START_TIME_FORMAT).to_string(),
            );
        }
    }

    fn device_state(&self, state: &mut Vec<(&'static str, Value)>) {
        state.push(("CameraState", Value::from(self.state.code())));
        state.push(("ImageReady", Value::from(self.image_ready)));
    }

    fn tick(&mut self, now: Instant) -> Duration {
        if let Some(phase) = self.phase
            && phase.is_complete(now)
        {
            match phase.target() {
                CameraState::Reading => {
                    self.begin_readout(now);
                    tracing::debug!("Exposure complete, reading out");
                }
                next => {
                    self.state = next;
                    self.phase = None;
                    self.image_ready = true;
                    tracing::debug!("Image ready");
                }
            }
        }
        if self.state.is_busy() { BUSY_TICK } else { IDLE_TICK }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AlpacaDevice, DeviceInfo, DeviceSlot};
    use crate::error::Status;
    use crate::protocol::{Params, Request};
    use crate::response::{ResponseBuilder, Trailer};

    fn slot(now: Instant) -> DeviceSlot<SimulatedCamera> {
        DeviceSlot::new(
            SimulatedCamera::default(),
            DeviceInfo::new(DeviceType::Camera, 0, "Main camera"),
            now,
        )
    }

    fn send(
        slot: &mut DeviceSlot<SimulatedCamera>,
        method: Method,
        command: &str,
        params: &str,
        now: Instant,
    ) -> (Result<(), DeviceError>, Value) {
        let request =
            Request::device(method, DeviceType::Camera, 0, command, Params::parse(params));
        let mut out = ResponseBuilder::new();
        let outcome = slot.dispatch(&request, now, &mut out);
        let json = out.finish(&Trailer::from_outcome(0, 0, &outcome));
        (outcome, serde_json::from_str(&json).unwrap())
    }

    #[test]
    fn exposure_pipeline() {
        let start = Instant::now();
        let mut slot = slot(start);

        send(&mut slot, Method::Put, "startexposure", "Duration=2&Light=true", start)
            .0
            .unwrap();
        assert_eq!(slot.driver().state(), CameraState::Exposing);
        let halfway = start + Duration::from_secs(1);
        assert_eq!(
            send(&mut slot, Method::Get, "percentcompleted", "", halfway).1["Value"],
            50.0
        );

        assert_eq!(slot.tick(start + Duration::from_secs(1)), BUSY_TICK);
        slot.tick(start + Duration::from_secs(2));
        assert_eq!(slot.driver().state(), CameraState::Reading);
        assert!(!slot.driver().image_ready());

        assert_eq!(slot.tick(start + Duration::from_secs(3)), IDLE_TICK);
        assert_eq!(slot.driver().state(), CameraState::Idle);
        assert!(slot.driver().image_ready());
        assert_eq!(
            send(&mut slot, Method::Get, "lastexposureduration", "", start).1["Value"],
            2.0
        );
    }

    #[test]
    fn busy_camera_rejects_second_exposure() {
        let now = Instant::now();
        let mut slot = slot(now);

        send(&mut slot, Method::Put, "startexposure", "Duration=10&Light=false", now)
            .0
            .unwrap();
        let (outcome, _) =
            send(&mut slot, Method::Put, "startexposure", "Duration=1&Light=true", now);
        assert_eq!(outcome.unwrap_err().status(), Status::InvalidOperation);
        assert!(!slot.driver().is_light_frame());
    }

    #[test]
    fn exposure_parameters_validated() {
        let now = Instant::now();
        let mut slot = slot(now);

        let (outcome, _) = send(&mut slot, Method::Put, "startexposure", "Duration=1", now);
        assert_eq!(outcome.unwrap_err().status(), Status::ValueNotSet);
        let (outcome, _) =
            send(&mut slot, Method::Put, "startexposure", "Duration=-1&Light=true", now);
        assert_eq!(outcome.unwrap_err().status(), Status::InvalidValue);
        let (outcome, _) =
            send(&mut slot, Method::Put, "startexposure", "Duration=7200&Light=true", now);
        assert_eq!(outcome.unwrap_err().status(), Status::InvalidValue);
        assert_eq!(slot.driver().state(), CameraState::Idle);
    }

    #[test]
    fn abort_returns_to_idle_without_image() {
        let now = Instant::now();
        let mut slot = slot(now);

        send(&mut slot, Method::Put, "startexposure", "Duration=5&Light=true", now)
            .0
            .unwrap();
        send(&mut slot, Method::Put, "abortexposure", "", now).0.unwrap();
        slot.tick(now + Duration::from_secs(10));
        assert_eq!(slot.driver().state(), CameraState::Idle);
        assert!(!slot.driver().image_ready());
    }

    #[test]
    fn stop_reads_out_early() {
        let start = Instant::now();
        let mut slot = slot(start);

        send(&mut slot, Method::Put, "startexposure", "Duration=60&Light=true", start)
            .0
            .unwrap();
        send(&mut slot, Method::Put, "stopexposure", "", start + Duration::from_secs(3))
            .0
            .unwrap();
        assert_eq!(slot.driver().state(), CameraState::Reading);

        slot.tick(start + Duration::from_secs(4));
        assert!(slot.driver().image_ready());
        assert_eq!(
            send(&mut slot, Method::Get, "lastexposureduration", "", start).1["Value"],
            3.0
        );
    }

    #[test]
    fn binning_and_gain() {
        let now = Instant::now();
        let mut slot = slot(now);

        send(&mut slot, Method::Put, "binx", "BinX=2", now).0.unwrap();
        assert_eq!(send(&mut slot, Method::Get, "binx", "", now).1["Value"], 2);
        let (outcome, _) = send(&mut slot, Method::Put, "biny", "BinY=5", now);
        assert_eq!(outcome.unwrap_err().status(), Status::InvalidValue);

        send(&mut slot, Method::Put, "gain", "Gain=120", now).0.unwrap();
        assert_eq!(send(&mut slot, Method::Get, "gain", "", now).1["Value"], 120);
        let (outcome, _) = send(&mut slot, Method::Put, "gain", "Gain=501", now);
        assert_eq!(outcome.unwrap_err().status(), Status::InvalidValue);
    }

    #[test]
    fn no_exposure_yet() {
        let now = Instant::now();
        let mut slot = slot(now);

        let (outcome, _) = send(&mut slot, Method::Get, "lastexposurestarttime", "", now);
        assert_eq!(outcome.unwrap_err().status(), Status::ValueNotSet);

        let (outcome, json) = send(&mut slot, Method::Get, "readall", "", now);
        assert!(outcome.is_ok());
        assert!(json.get("lastexposureduration").is_none());
        assert_eq!(json["sensorname"], "Simulated CMOS");
    }
}
