// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover/calibrator device.
//!
//! Drives a flat-field light and a motorised dust cover through a
//! [`CalibratorHardware`] back-end. The back-end only receives
//! fire-and-forget calls; cover travel is tracked here as a timed
//! [`Transition`] that the scheduler completes on a later tick.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use super::{Call, Driver, ReadAll};
use crate::capabilities::Capabilities;
use crate::command::CommandEntry;
use crate::error::DeviceError;
use crate::state::{CalibratorState, CoverState, Transition};
use crate::types::{Access, DeviceType, Method};

/// Time the cover takes to fully open or close.
pub const COVER_TRAVEL_TIME: Duration = Duration::from_secs(5);

/// Delay between ticks, moving or not.
pub const TICK_DELAY: Duration = Duration::from_secs(2);

/// Back-end that switches the light and moves the cover.
///
/// Calls must return promptly; motion completion is timed by the driver.
pub trait CalibratorHardware: Send + 'static {
    /// Opens the hardware connection.
    ///
    /// # Errors
    ///
    /// Returns the failure to report at start-up.
    fn init(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Sets the light level; zero switches it off.
    ///
    /// # Errors
    ///
    /// Returns the failure to report to the client.
    fn set_light(&mut self, brightness: u32) -> Result<(), DeviceError>;

    /// Starts moving the cover towards `target` (`Open` or `Closed`).
    ///
    /// # Errors
    ///
    /// Returns the failure to report to the client.
    fn move_cover(&mut self, target: CoverState) -> Result<(), DeviceError>;

    /// Stops the cover wherever it is.
    ///
    /// # Errors
    ///
    /// Returns the failure to report to the client.
    fn halt_cover(&mut self) -> Result<(), DeviceError>;

    /// Sets the cover opening, in percent.
    ///
    /// # Errors
    ///
    /// Returns the failure to report to the client.
    fn set_aperture(&mut self, _percent: f64) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// In-memory back-end that accepts every call.
#[derive(Debug, Default, Clone)]
pub struct SimulatedCalibrator {
    light: u32,
    last_cover_command: Option<CoverState>,
}

impl SimulatedCalibrator {
    /// Last light level set.
    #[must_use]
    pub const fn light(&self) -> u32 {
        self.light
    }

    /// Last cover target requested, `Unknown` after a halt.
    #[must_use]
    pub const fn last_cover_command(&self) -> Option<CoverState> {
        self.last_cover_command
    }
}

impl CalibratorHardware for SimulatedCalibrator {
    fn set_light(&mut self, brightness: u32) -> Result<(), DeviceError> {
        tracing::trace!(brightness, "Simulated light level");
        self.light = brightness;
        Ok(())
    }

    fn move_cover(&mut self, target: CoverState) -> Result<(), DeviceError> {
        tracing::trace!(target = %target, "Simulated cover move");
        self.last_cover_command = Some(target);
        Ok(())
    }

    fn halt_cover(&mut self) -> Result<(), DeviceError> {
        self.last_cover_command = Some(CoverState::Unknown);
        Ok(())
    }
}

/// Identifiers of the cover/calibrator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibratorCommand {
    /// Cover opening in percent (GET/PUT).
    Aperture,
    /// Current light level.
    Brightness,
    /// Switch the light off.
    CalibratorOff,
    /// Switch the light on at `Brightness`.
    CalibratorOn,
    /// Whether the light is on and stable.
    CalibratorReady,
    /// Light state.
    CalibratorState,
    /// Whether the aperture can be set.
    CanAdjustAperture,
    /// Start closing the cover.
    CloseCover,
    /// Whether the cover is travelling.
    CoverMoving,
    /// Cover state.
    CoverState,
    /// Stop the cover.
    HaltCover,
    /// Highest light level.
    MaxBrightness,
    /// Start opening the cover.
    OpenCover,
}

const COMMANDS: &[CommandEntry<CalibratorCommand>] = &[
    CommandEntry::new("aperture", CalibratorCommand::Aperture, Access::Both),
    CommandEntry::new("brightness", CalibratorCommand::Brightness, Access::Get),
    CommandEntry::new("calibratoroff", CalibratorCommand::CalibratorOff, Access::Put),
    CommandEntry::new("calibratoron", CalibratorCommand::CalibratorOn, Access::Put),
    CommandEntry::new("calibratorready", CalibratorCommand::CalibratorReady, Access::Get),
    CommandEntry::new("calibratorstate", CalibratorCommand::CalibratorState, Access::Get),
    CommandEntry::new("canadjustaperture", CalibratorCommand::CanAdjustAperture, Access::Get),
    CommandEntry::new("closecover", CalibratorCommand::CloseCover, Access::Put),
    CommandEntry::new("covermoving", CalibratorCommand::CoverMoving, Access::Get),
    CommandEntry::new("coverstate", CalibratorCommand::CoverState, Access::Get),
    CommandEntry::new("haltcover", CalibratorCommand::HaltCover, Access::Put),
    CommandEntry::new("maxbrightness", CalibratorCommand::MaxBrightness, Access::Get),
    CommandEntry::new("opencover", CalibratorCommand::OpenCover, Access::Put),
];

/// A cover/calibrator unit.
///
/// # Examples
///
/// ```
/// use alpaca_hub::device::CoverCalibrator;
/// use alpaca_hub::state::{CalibratorState, CoverState};
/// use alpaca_hub::Capabilities;
///
/// let unit = CoverCalibrator::simulated(Capabilities::flat_panel());
/// assert_eq!(unit.cover_state(), CoverState::NotPresent);
/// assert_eq!(unit.calibrator_state(), CalibratorState::Off);
/// ```
pub struct CoverCalibrator<H: CalibratorHardware = SimulatedCalibrator> {
    hardware: H,
    caps: Capabilities,
    brightness: u32,
    calibrator_state: CalibratorState,
    cover_state: CoverState,
    cover_motion: Option<Transition<CoverState>>,
    warmup: Option<Transition<CalibratorState>>,
    aperture: f64,
}

impl CoverCalibrator<SimulatedCalibrator> {
    /// Creates a unit backed by [`SimulatedCalibrator`].
    #[must_use]
    pub fn simulated(caps: Capabilities) -> Self {
        Self::new(SimulatedCalibrator::default(), caps)
    }
}

impl<H: CalibratorHardware> CoverCalibrator<H> {
    /// Creates a unit: light off, cover closed, for the parts present.
    #[must_use]
    pub fn new(hardware: H, caps: Capabilities) -> Self {
        Self {
            hardware,
            caps,
            brightness: 0,
            calibrator_state: if caps.calibrator {
                CalibratorState::Off
            } else {
                CalibratorState::NotPresent
            },
            cover_state: if caps.cover {
                CoverState::Closed
            } else {
                CoverState::NotPresent
            },
            cover_motion: None,
            warmup: None,
            aperture: 0.0,
        }
    }

    /// Capabilities of the unit.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Current light level.
    #[must_use]
    pub const fn brightness(&self) -> u32 {
        self.brightness
    }

    /// Light state.
    #[must_use]
    pub const fn calibrator_state(&self) -> CalibratorState {
        self.calibrator_state
    }

    /// Cover state.
    #[must_use]
    pub const fn cover_state(&self) -> CoverState {
        self.cover_state
    }

    /// The back-end.
    #[must_use]
    pub const fn hardware(&self) -> &H {
        &self.hardware
    }

    fn require_calibrator(&self) -> Result<(), DeviceError> {
        if self.caps.calibrator {
            Ok(())
        } else {
            Err(DeviceError::not_implemented("Calibrator not present"))
        }
    }

    fn require_cover(&self) -> Result<(), DeviceError> {
        if self.caps.cover {
            Ok(())
        } else {
            Err(DeviceError::not_implemented("Cover not present"))
        }
    }

    fn require_aperture(&self) -> Result<(), DeviceError> {
        if self.caps.cover && self.caps.adjustable_aperture {
            Ok(())
        } else {
            Err(DeviceError::not_implemented("Aperture is not adjustable"))
        }
    }

    fn max_brightness(&self) -> Result<u32, DeviceError> {
        self.require_calibrator()?;
        Ok(self.caps.max_brightness)
    }

    fn current_brightness(&self) -> Result<u32, DeviceError> {
        self.require_calibrator()?;
        Ok(self.brightness)
    }

    fn current_aperture(&self) -> Result<f64, DeviceError> {
        self.require_aperture()?;
        Ok(self.aperture)
    }

    fn turn_on(&mut self, call: &Call<'_>) -> Result<(), DeviceError> {
        self.require_calibrator()?;
        let requested = call.params().integer("Brightness")?;
        let level = u32::try_from(requested)
            .ok()
            .filter(|_| self.caps.accepts_brightness(requested))
            .ok_or_else(|| {
                DeviceError::invalid_value(format!(
                    "Brightness {requested} out of range 0..={}",
                    self.caps.max_brightness
                ))
            })?;

        self.hardware.set_light(level)?;
        self.brightness = level;
        if self.caps.warmup.is_zero() {
            self.calibrator_state = CalibratorState::Ready;
            self.warmup = None;
        } else {
            self.calibrator_state = CalibratorState::NotReady;
            self.warmup = Some(Transition::new(
                CalibratorState::Ready,
                call.now(),
                self.caps.warmup,
            ));
        }
        tracing::debug!(brightness = level, "Calibrator on");
        Ok(())
    }

    fn turn_off(&mut self) -> Result<(), DeviceError> {
        self.require_calibrator()?;
        self.hardware.set_light(0)?;
        self.brightness = 0;
        self.calibrator_state = CalibratorState::Off;
        self.warmup = None;
        tracing::debug!("Calibrator off");
        Ok(())
    }

    fn start_cover(&mut self, target: CoverState, now: Instant) -> Result<(), DeviceError> {
        self.require_cover()?;
        self.hardware.move_cover(target)?;
        self.cover_state = CoverState::Moving;
        self.cover_motion = Some(Transition::new(target, now, COVER_TRAVEL_TIME));
        tracing::debug!(target = %target, "Cover moving");
        Ok(())
    }

    fn halt(&mut self) -> Result<(), DeviceError> {
        self.require_cover()?;
        self.hardware.halt_cover()?;
        self.cover_state = CoverState::Unknown;
        self.cover_motion = None;
        tracing::debug!("Cover halted");
        Ok(())
    }

    fn set_aperture(&mut self, call: &Call<'_>) -> Result<(), DeviceError> {
        self.require_aperture()?;
        let percent = call.params().number("Aperture")?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(DeviceError::invalid_value(format!(
                "Aperture {percent} out of range 0..=100"
            )));
        }
        self.hardware.set_aperture(percent)?;
        self.aperture = percent;
        Ok(())
    }
}

impl<H: CalibratorHardware> Driver for CoverCalibrator<H> {
    type Command = CalibratorCommand;

    const DEVICE_TYPE: DeviceType = DeviceType::CoverCalibrator;
    const COMMANDS: &'static [CommandEntry<CalibratorCommand>] = COMMANDS;
    const INTERFACE_VERSION: i32 = 2;
    const DRIVER_INFO: &'static str = "alpaca-hub cover/calibrator";

    fn init_hardware(&mut self) -> Result<(), DeviceError> {
        self.hardware.init()
    }

    fn handle(
        &mut self,
        command: CalibratorCommand,
        call: &mut Call<'_>,
    ) -> Result<(), DeviceError> {
        match command {
            CalibratorCommand::Aperture => match call.method() {
                Method::Get => call.reply(self.current_aperture()?),
                Method::Put => self.set_aperture(call)?,
            },
            CalibratorCommand::Brightness => call.reply(self.current_brightness()?),
            CalibratorCommand::CalibratorOff => self.turn_off()?,
            CalibratorCommand::CalibratorOn => self.turn_on(call)?,
            CalibratorCommand::CalibratorReady => {
                call.reply(self.calibrator_state == CalibratorState::Ready);
            }
            CalibratorCommand::CalibratorState => call.reply(self.calibrator_state.code()),
            CalibratorCommand::CanAdjustAperture => {
                call.reply(self.caps.cover && self.caps.adjustable_aperture);
            }
            CalibratorCommand::CloseCover => self.start_cover(CoverState::Closed, call.now())?,
            CalibratorCommand::CoverMoving => call.reply(self.cover_state == CoverState::Moving),
            CalibratorCommand::CoverState => call.reply(self.cover_state.code()),
            CalibratorCommand::HaltCover => self.halt()?,
            CalibratorCommand::MaxBrightness => call.reply(self.max_brightness()?),
            CalibratorCommand::OpenCover => self.start_cover(CoverState::Open, call.now())?,
        }
        Ok(())
    }

    fn read_all(&self, fields: &mut ReadAll<'_>) {
        if self.caps.calibrator {
            fields.add_result("brightness", self.current_brightness());
            fields.add_result("maxbrightness", self.max_brightness());
        }
        fields.add("calibratorstate", self.calibrator_state.code());
        fields.add("calibratorstate-str", self.calibrator_state.as_str());
        fields.add("calibratorready", self.calibrator_state == CalibratorState::Ready);
        fields.add("coverstate", self.cover_state.code());
        fields.add("coverstate-str", self.cover_state.as_str());
        fields.add("covermoving", self.cover_state == CoverState::Moving);
        fields.add("canadjustaperture", self.caps.cover && self.caps.adjustable_aperture);
        if self.caps.adjustable_aperture {
            fields.add_result("aperture", self.current_aperture());
        }
    }

    fn device_state(&self, state: &mut Vec<(&'static str, Value)>) {
        state.push(("CalibratorState", Value::from(self.calibrator_state.code())));
        state.push(("CoverState", Value::from(self.cover_state.code())));
        state.push((
            "CalibratorReady",
            Value::from(self.calibrator_state == CalibratorState::Ready),
        ));
        state.push(("CoverMoving", Value::from(self.cover_state == CoverState::Moving)));
    }

    fn tick(&mut self, now: Instant) -> Duration {
        if let Some(motion) = self.cover_motion
            && motion.is_complete(now)
        {
            self.cover_state = motion.target();
            self.cover_motion = None;
            tracing::debug!(state = %self.cover_state, "Cover motion complete");
        }
        if let Some(warmup) = self.warmup
            && warmup.is_complete(now)
        {
            self.calibrator_state = warmup.target();
            self.warmup = None;
            tracing::debug!("Calibrator ready");
        }
        TICK_DELAY
    }

    fn on_watchdog_timeout(&mut self) {
        if self.caps.calibrator && self.brightness > 0 {
            match self.turn_off() {
                Ok(()) => tracing::info!("Light switched off by watchdog"),
                Err(err) => tracing::warn!(error = %err, "Watchdog could not switch light off"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitiesBuilder;
    use crate::device::{AlpacaDevice, DeviceInfo, DeviceSlot};
    use crate::error::Status;
    use crate::protocol::{Params, Request};
    use crate::response::{ResponseBuilder, Trailer};

    type Slot<H> = DeviceSlot<CoverCalibrator<H>>;

    fn slot<H: CalibratorHardware>(hardware: H, caps: Capabilities, now: Instant) -> Slot<H> {
        DeviceSlot::new(
            CoverCalibrator::new(hardware, caps),
            DeviceInfo::new(DeviceType::CoverCalibrator, 0, "Flat panel"),
            now,
        )
    }

    fn send<H: CalibratorHardware>(
        slot: &mut Slot<H>,
        method: Method,
        command: &str,
        params: &str,
        now: Instant,
    ) -> (Result<(), DeviceError>, serde_json::Value) {
        let request = Request::device(
            method,
            DeviceType::CoverCalibrator,
            0,
            command,
            Params::parse(params),
        );
        let mut out = ResponseBuilder::new();
        let outcome = slot.dispatch(&request, now, &mut out);
        let json = out.finish(&Trailer::from_outcome(0, 0, &outcome));
        (outcome, serde_json::from_str(&json).unwrap())
    }

    struct BrokenHardware;

    impl CalibratorHardware for BrokenHardware {
        fn set_light(&mut self, _brightness: u32) -> Result<(), DeviceError> {
            Err(DeviceError::not_connected("controller unplugged"))
        }

        fn move_cover(&mut self, _target: CoverState) -> Result<(), DeviceError> {
            Err(DeviceError::not_connected("controller unplugged"))
        }

        fn halt_cover(&mut self) -> Result<(), DeviceError> {
            Err(DeviceError::not_connected("controller unplugged"))
        }
    }

    #[test]
    fn calibrator_on_then_off() {
        let now = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), now);

        let (outcome, _) = send(&mut slot, Method::Put, "calibratoron", "Brightness=100", now);
        assert!(outcome.is_ok());
        assert_eq!(slot.driver().brightness(), 100);
        assert_eq!(slot.driver().calibrator_state(), CalibratorState::Ready);
        assert_eq!(slot.driver().hardware().light(), 100);

        let (outcome, _) = send(&mut slot, Method::Put, "calibratoroff", "", now);
        assert!(outcome.is_ok());
        assert_eq!(slot.driver().brightness(), 0);
        assert_eq!(slot.driver().calibrator_state(), CalibratorState::Off);
    }

    #[test]
    fn brightness_validation() {
        let now = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), now);

        let (outcome, json) = send(&mut slot, Method::Put, "calibratoron", "", now);
        assert_eq!(outcome.unwrap_err().status(), Status::ValueNotSet);
        assert_eq!(json["ErrorMessage"], "Brightness not specified");

        for bad in ["Brightness=256", "Brightness=-1", "Brightness=bright"] {
            let (outcome, _) = send(&mut slot, Method::Put, "calibratoron", bad, now);
            assert_eq!(outcome.unwrap_err().status(), Status::InvalidValue, "{bad}");
        }
        assert_eq!(slot.driver().calibrator_state(), CalibratorState::Off);

        let (outcome, _) = send(&mut slot, Method::Put, "calibratoron", "brightness=255", now);
        assert!(outcome.is_ok());
    }

    #[test]
    fn cover_travel_completes_on_tick() {
        let start = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), start);

        let (outcome, _) = send(&mut slot, Method::Put, "opencover", "", start);
        assert!(outcome.is_ok());
        let (_, json) = send(&mut slot, Method::Get, "coverstate", "", start);
        assert_eq!(json["Value"], CoverState::Moving.code());
        assert_eq!(send(&mut slot, Method::Get, "covermoving", "", start).1["Value"], true);

        assert_eq!(slot.tick(start + Duration::from_secs(2)), TICK_DELAY);
        assert_eq!(slot.driver().cover_state(), CoverState::Moving);

        slot.tick(start + COVER_TRAVEL_TIME);
        assert_eq!(slot.driver().cover_state(), CoverState::Open);

        send(&mut slot, Method::Put, "closecover", "", start + Duration::from_secs(6))
            .0
            .unwrap();
        slot.tick(start + Duration::from_secs(12));
        assert_eq!(slot.driver().cover_state(), CoverState::Closed);
    }

    #[test]
    fn halt_overrides_motion() {
        let start = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), start);

        send(&mut slot, Method::Put, "closecover", "", start).0.unwrap();
        send(&mut slot, Method::Put, "haltcover", "", start + Duration::from_millis(10))
            .0
            .unwrap();
        assert_eq!(slot.driver().cover_state(), CoverState::Unknown);

        slot.tick(start + Duration::from_secs(30));
        assert_eq!(slot.driver().cover_state(), CoverState::Unknown);
        assert_eq!(
            slot.driver().hardware().last_cover_command(),
            Some(CoverState::Unknown)
        );
    }

    #[test]
    fn terminal_ticks_are_idempotent() {
        let start = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), start);

        for i in 1..=5 {
            assert_eq!(slot.tick(start + Duration::from_secs(i)), TICK_DELAY);
            assert_eq!(slot.driver().cover_state(), CoverState::Closed);
            assert_eq!(slot.driver().calibrator_state(), CalibratorState::Off);
        }
    }

    #[test]
    fn missing_parts_are_not_implemented() {
        let now = Instant::now();
        let mut panel = slot(SimulatedCalibrator::default(), Capabilities::flat_panel(), now);
        for command in ["opencover", "closecover", "haltcover"] {
            let (outcome, json) = send(&mut panel, Method::Put, command, "", now);
            assert_eq!(outcome.unwrap_err().status(), Status::NotImplemented);
            assert_eq!(json["ErrorMessage"], "Cover not present");
        }
        assert_eq!(panel.driver().cover_state(), CoverState::NotPresent);
        assert_eq!(panel.driver().hardware().last_cover_command(), None);

        let mut cover = slot(SimulatedCalibrator::default(), Capabilities::dust_cover(), now);
        for (method, command, params) in [
            (Method::Put, "calibratoron", "Brightness=10"),
            (Method::Put, "calibratoroff", ""),
            (Method::Get, "brightness", ""),
            (Method::Get, "maxbrightness", ""),
        ] {
            let (outcome, json) = send(&mut cover, method, command, params, now);
            assert_eq!(outcome.unwrap_err().status(), Status::NotImplemented);
            assert_eq!(json["ErrorMessage"], "Calibrator not present");
        }
        assert_eq!(cover.driver().calibrator_state(), CalibratorState::NotPresent);
        assert_eq!(cover.driver().brightness(), 0);
    }

    #[test]
    fn absent_parts_report_not_present_state() {
        let now = Instant::now();
        let mut panel = slot(SimulatedCalibrator::default(), Capabilities::flat_panel(), now);
        let (outcome, json) = send(&mut panel, Method::Get, "coverstate", "", now);
        assert!(outcome.is_ok());
        assert_eq!(json["Value"], CoverState::NotPresent.code());
    }

    #[test]
    fn hardware_failure_leaves_state() {
        let now = Instant::now();
        let mut slot = slot(BrokenHardware, Capabilities::full(), now);

        let (outcome, json) = send(&mut slot, Method::Put, "calibratoron", "Brightness=5", now);
        assert_eq!(outcome.unwrap_err().status(), Status::NotConnected);
        assert_eq!(json["ErrorMessage"], "controller unplugged");
        assert_eq!(slot.driver().brightness(), 0);

        let (outcome, _) = send(&mut slot, Method::Put, "opencover", "", now);
        assert!(outcome.is_err());
        assert_eq!(slot.driver().cover_state(), CoverState::Closed);
    }

    #[test]
    fn warmup_passes_through_not_ready() {
        let start = Instant::now();
        let caps = CapabilitiesBuilder::new()
            .warmup(Duration::from_secs(3))
            .build();
        let mut slot = slot(SimulatedCalibrator::default(), caps, start);

        send(&mut slot, Method::Put, "calibratoron", "Brightness=20", start)
            .0
            .unwrap();
        assert_eq!(slot.driver().calibrator_state(), CalibratorState::NotReady);
        assert_eq!(
            send(&mut slot, Method::Get, "calibratorready", "", start).1["Value"],
            false
        );

        slot.tick(start + Duration::from_secs(3));
        assert_eq!(slot.driver().calibrator_state(), CalibratorState::Ready);
    }

    #[test]
    fn aperture_requires_capability() {
        let now = Instant::now();
        let mut fixed = slot(SimulatedCalibrator::default(), Capabilities::full(), now);
        let (outcome, _) = send(&mut fixed, Method::Get, "aperture", "", now);
        assert_eq!(outcome.unwrap_err().status(), Status::NotImplemented);
        assert_eq!(
            send(&mut fixed, Method::Get, "canadjustaperture", "", now).1["Value"],
            false
        );

        let caps = CapabilitiesBuilder::new().with_adjustable_aperture().build();
        let mut iris = slot(SimulatedCalibrator::default(), caps, now);
        send(&mut iris, Method::Put, "aperture", "Aperture=42,5", now)
            .0
            .unwrap();
        assert_eq!(send(&mut iris, Method::Get, "aperture", "", now).1["Value"], 42.5);

        let (outcome, _) = send(&mut iris, Method::Put, "aperture", "Aperture=101", now);
        assert_eq!(outcome.unwrap_err().status(), Status::InvalidValue);
    }

    #[test]
    fn readall_lists_present_parts() {
        let now = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), now);
        let (outcome, json) = send(&mut slot, Method::Get, "readall", "", now);

        assert!(outcome.is_ok());
        assert_eq!(json["brightness"], 0);
        assert_eq!(json["maxbrightness"], 255);
        assert_eq!(json["coverstate"], 1);
        assert_eq!(json["calibratorstate-str"], "Off");
        assert!(json.get("aperture").is_none());

        let mut cover = self::slot(SimulatedCalibrator::default(), Capabilities::dust_cover(), now);
        let (outcome, json) = send(&mut cover, Method::Get, "readall", "", now);
        assert!(outcome.is_ok());
        assert!(json.get("brightness").is_none());
        assert_eq!(json["calibratorstate"], 0);
    }

    #[test]
    fn devicestate_entries() {
        let now = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), now);
        let (_, json) = send(&mut slot, Method::Get, "devicestate", "", now);

        let names: Vec<&str> = json["Value"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["Name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "CalibratorState",
                "CoverState",
                "CalibratorReady",
                "CoverMoving",
                "TimeStamp"
            ]
        );
    }

    #[test]
    fn watchdog_turns_light_off() {
        let start = Instant::now();
        let mut slot = slot(SimulatedCalibrator::default(), Capabilities::full(), start);
        send(&mut slot, Method::Put, "calibratoron", "Brightness=80", start)
            .0
            .unwrap();

        slot.tick(start + Duration::from_secs(299));
        assert_eq!(slot.driver().brightness(), 80);

        slot.tick(start + Duration::from_secs(300));
        assert_eq!(slot.driver().brightness(), 0);
        assert_eq!(slot.driver().calibrator_state(), CalibratorState::Off);
    }
}
