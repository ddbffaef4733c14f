// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configured devices.
//!
//! Each `[[device]]` table of the configuration file names a device type
//! and its options:
//!
//! ```toml
//! [[device]]
//! type = "covercalibrator"
//! name = "Flat panel"
//! preset = "flat_panel"
//! max_brightness = 1023
//!
//! [[device]]
//! type = "switch"
//! count = 4
//! read_only = [3]
//! ```

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use super::DeviceRegistry;
use crate::capabilities::{Capabilities, CapabilitiesBuilder};
use crate::device::{
    CameraSettings, CoverCalibrator, DEFAULT_SWITCH_COUNT, FocuserSettings, SimulatedCamera,
    SimulatedFocuser, SimulatedSwitch, SwitchChannel,
};
use crate::error::ConfigError;

/// One configured device.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceConfig {
    /// A cover/calibrator.
    CoverCalibrator(CalibratorConfig),
    /// A switch bank.
    Switch(SwitchConfig),
    /// An absolute focuser.
    Focuser(FocuserConfig),
    /// A camera.
    Camera(CameraConfig),
}

/// Starting point for a cover/calibrator's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityPreset {
    /// Cover and light.
    #[default]
    Full,
    /// Light only.
    FlatPanel,
    /// Cover only.
    DustCover,
}

impl CapabilityPreset {
    const fn capabilities(self) -> Capabilities {
        match self {
            Self::Full => Capabilities::full(),
            Self::FlatPanel => Capabilities::flat_panel(),
            Self::DustCover => Capabilities::dust_cover(),
        }
    }
}

/// Options of a cover/calibrator.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CalibratorConfig {
    /// Device name.
    pub name: Option<String>,
    /// Device description.
    pub description: Option<String>,
    /// Capability preset, refined by the fields below.
    pub preset: CapabilityPreset,
    /// Overrides the preset's cover.
    pub cover: Option<bool>,
    /// Overrides the preset's light.
    pub calibrator: Option<bool>,
    /// Overrides the preset's maximum brightness.
    pub max_brightness: Option<u32>,
    /// Enables the adjustable aperture.
    pub adjustable_aperture: bool,
    /// Light warm-up time in milliseconds.
    pub warmup_ms: u64,
}

impl CalibratorConfig {
    /// Resolves the capabilities.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        let preset = self.preset.capabilities();
        let mut builder = CapabilitiesBuilder::new()
            .cover(self.cover.unwrap_or(preset.cover))
            .calibrator(self.calibrator.unwrap_or(preset.calibrator))
            .max_brightness(self.max_brightness.unwrap_or(preset.max_brightness))
            .warmup(Duration::from_millis(self.warmup_ms));
        if self.adjustable_aperture {
            builder = builder.with_adjustable_aperture();
        }
        builder.build()
    }
}

/// Options of a switch bank.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Device name.
    pub name: Option<String>,
    /// Device description.
    pub description: Option<String>,
    /// Number of channels.
    pub count: usize,
    /// Channel names, by index; missing ones are numbered.
    pub names: Vec<String>,
    /// Indices of read-only channels.
    pub read_only: Vec<usize>,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            count: DEFAULT_SWITCH_COUNT,
            names: Vec::new(),
            read_only: Vec::new(),
        }
    }
}

impl SwitchConfig {
    fn bank(&self) -> SimulatedSwitch {
        SimulatedSwitch::with_channels((0..self.count).map(|i| {
            let name = self
                .names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Switch {i}"));
            let channel = SwitchChannel::boolean(name);
            if self.read_only.contains(&i) {
                channel.read_only()
            } else {
                channel
            }
        }))
    }
}

/// Options of a focuser.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FocuserConfig {
    /// Device name.
    pub name: Option<String>,
    /// Device description.
    pub description: Option<String>,
    /// Focuser characteristics.
    #[serde(flatten)]
    pub settings: FocuserSettings,
}

/// Options of a camera.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device name.
    pub name: Option<String>,
    /// Device description.
    pub description: Option<String>,
    /// Camera characteristics.
    #[serde(flatten)]
    pub settings: CameraSettings,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl DeviceConfig {
    /// One simulator of each type.
    #[must_use]
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::CoverCalibrator(CalibratorConfig::default()),
            Self::Switch(SwitchConfig::default()),
            Self::Focuser(FocuserConfig::default()),
            Self::Camera(CameraConfig::default()),
        ]
    }

    /// Name used when none is configured.
    #[must_use]
    pub const fn default_name(&self) -> &'static str {
        match self {
            Self::CoverCalibrator(_) => "Simulated cover/calibrator",
            Self::Switch(_) => "Simulated switch",
            Self::Focuser(_) => "Simulated focuser",
            Self::Camera(_) => "Simulated camera",
        }
    }

    fn identity(&self) -> (Option<&String>, Option<&String>) {
        match self {
            Self::CoverCalibrator(c) => (c.name.as_ref(), c.description.as_ref()),
            Self::Switch(c) => (c.name.as_ref(), c.description.as_ref()),
            Self::Focuser(c) => (c.name.as_ref(), c.description.as_ref()),
            Self::Camera(c) => (c.name.as_ref(), c.description.as_ref()),
        }
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::CoverCalibrator(c) => {
                let caps = c.capabilities();
                if !caps.cover && !caps.calibrator {
                    return Err(invalid("cover", "a cover/calibrator needs a cover or a light"));
                }
                if caps.calibrator && caps.max_brightness == 0 {
                    return Err(invalid("max_brightness", "must be at least 1 with a light"));
                }
            }
            Self::Switch(c) => {
                if c.count == 0 {
                    return Err(invalid("count", "a switch bank needs at least one channel"));
                }
                if let Some(index) = c.read_only.iter().find(|&&i| i >= c.count) {
                    return Err(invalid("read_only", format!("no channel {index}")));
                }
            }
            Self::Focuser(c) => {
                let s = &c.settings;
                if s.max_step <= 0 {
                    return Err(invalid("max_step", "must be positive"));
                }
                if !(0..=s.max_step).contains(&s.position) {
                    return Err(invalid("position", format!("must be within 0..={}", s.max_step)));
                }
                if s.max_increment <= 0 {
                    return Err(invalid("max_increment", "must be positive"));
                }
            }
            Self::Camera(c) => {
                let s = &c.settings;
                if s.max_bin == 0 {
                    return Err(invalid("max_bin", "must be at least 1"));
                }
                if s.exposure_min < 0.0 || s.exposure_min > s.exposure_max {
                    return Err(invalid("exposure_min", "must be within 0..=exposure_max"));
                }
                if s.gain_min > s.gain_max {
                    return Err(invalid("gain_min", "must not exceed gain_max"));
                }
                if !(s.readout_secs.is_finite() && s.readout_secs >= 0.0) {
                    return Err(invalid("readout_secs", "must be a non-negative number"));
                }
            }
        }
        Ok(())
    }

    /// Creates the device and registers it; returns its number.
    pub fn register(&self, registry: &mut DeviceRegistry, now: Instant) -> u32 {
        let (name, description) = self.identity();
        let name = name.map_or(self.default_name(), String::as_str).to_string();
        let description = description.cloned().unwrap_or_else(|| name.clone());

        match self {
            Self::CoverCalibrator(c) => registry.register_described(
                CoverCalibrator::simulated(c.capabilities()),
                name,
                description,
                now,
            ),
            Self::Switch(c) => registry.register_described(c.bank(), name, description, now),
            Self::Focuser(c) => registry.register_described(
                SimulatedFocuser::new(c.settings.clone()),
                name,
                description,
                now,
            ),
            Self::Camera(c) => registry.register_described(
                SimulatedCamera::new(c.settings.clone()),
                name,
                description,
                now,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ServerInfo;

    #[derive(Deserialize)]
    struct Devices {
        device: Vec<DeviceConfig>,
    }

    fn parse(text: &str) -> Vec<DeviceConfig> {
        toml::from_str::<Devices>(text).unwrap().device
    }

    #[test]
    fn calibrator_preset_with_overrides() {
        let devices = parse(
            r#"
            [[device]]
            type = "covercalibrator"
            name = "Panel"
            preset = "flat_panel"
            max_brightness = 1023
            warmup_ms = 1500
            "#,
        );
        let DeviceConfig::CoverCalibrator(config) = &devices[0] else {
            panic!("wrong variant: {:?}", devices[0]);
        };
        let caps = config.capabilities();
        assert!(!caps.cover);
        assert!(caps.calibrator);
        assert_eq!(caps.max_brightness, 1023);
        assert_eq!(caps.warmup, Duration::from_millis(1500));
        assert!(devices[0].validate().is_ok());
    }

    #[test]
    fn flattened_settings() {
        let devices = parse(
            r#"
            [[device]]
            type = "focuser"
            max_step = 50000
            step_rate = 250

            [[device]]
            type = "camera"
            sensor_name = "IMX571"
            max_bin = 2
            "#,
        );
        let DeviceConfig::Focuser(focuser) = &devices[0] else {
            panic!("wrong variant");
        };
        assert_eq!(focuser.settings.max_step, 50_000);
        assert_eq!(focuser.settings.step_rate, 250);
        assert_eq!(focuser.settings.position, 4570);

        let DeviceConfig::Camera(camera) = &devices[1] else {
            panic!("wrong variant");
        };
        assert_eq!(camera.settings.sensor_name, "IMX571");
        assert_eq!(camera.settings.max_bin, 2);
    }

    #[test]
    fn validation_errors() {
        let devices = parse(
            r#"
            [[device]]
            type = "switch"
            count = 2
            read_only = [5]

            [[device]]
            type = "covercalibrator"
            cover = false
            calibrator = false

            [[device]]
            type = "camera"
            exposure_min = 10.0
            exposure_max = 1.0
            "#,
        );
        for device in &devices {
            assert!(matches!(device.validate(), Err(ConfigError::Invalid { .. })), "{device:?}");
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = toml::from_str::<Devices>("[[device]]\ntype = \"telescope\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn registration_uses_names() {
        let now = Instant::now();
        let mut registry = DeviceRegistry::new(ServerInfo::default());
        for device in DeviceConfig::default_set() {
            device.register(&mut registry, now);
        }
        let switch =
            parse("[[device]]\ntype = \"switch\"\nname = \"Roof power\"\nnames = [\"Mount\"]\n");
        assert_eq!(switch[0].register(&mut registry, now), 1);

        let names: Vec<&str> = registry.devices().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Simulated cover/calibrator",
                "Simulated switch",
                "Simulated focuser",
                "Simulated camera",
                "Roof power",
            ]
        );
    }
}
