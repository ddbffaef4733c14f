// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alpaca device type tags.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The category of an instrument exposed by the server.
///
/// The lowercase form is the path segment used in
/// `/api/v1/{devicetype}/{n}/{command}`; the camel-case form is the name
/// reported by the management API.
///
/// # Examples
///
/// ```
/// use alpaca_hub::types::DeviceType;
///
/// let kind: DeviceType = "CoverCalibrator".parse().unwrap();
/// assert_eq!(kind, DeviceType::CoverCalibrator);
/// assert_eq!(kind.as_str(), "covercalibrator");
/// assert_eq!(kind.display_name(), "CoverCalibrator");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// Imaging camera.
    Camera,
    /// Flat-field panel with an optional dust cover.
    CoverCalibrator,
    /// Observatory dome or roll-off roof.
    Dome,
    /// Filter wheel.
    FilterWheel,
    /// Focuser.
    Focuser,
    /// Weather and sky-condition sensors.
    ObservingConditions,
    /// Field rotator.
    Rotator,
    /// Safety monitor.
    SafetyMonitor,
    /// Bank of switches or relays.
    Switch,
    /// Telescope mount.
    Telescope,
}

impl DeviceType {
    /// Every device type, in management-API order.
    pub const ALL: [Self; 10] = [
        Self::Camera,
        Self::CoverCalibrator,
        Self::Dome,
        Self::FilterWheel,
        Self::Focuser,
        Self::ObservingConditions,
        Self::Rotator,
        Self::SafetyMonitor,
        Self::Switch,
        Self::Telescope,
    ];

    /// Returns the lowercase path segment.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::CoverCalibrator => "covercalibrator",
            Self::Dome => "dome",
            Self::FilterWheel => "filterwheel",
            Self::Focuser => "focuser",
            Self::ObservingConditions => "observingconditions",
            Self::Rotator => "rotator",
            Self::SafetyMonitor => "safetymonitor",
            Self::Switch => "switch",
            Self::Telescope => "telescope",
        }
    }

    /// Returns the camel-case name used by the management API.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::CoverCalibrator => "CoverCalibrator",
            Self::Dome => "Dome",
            Self::FilterWheel => "FilterWheel",
            Self::Focuser => "Focuser",
            Self::ObservingConditions => "ObservingConditions",
            Self::Rotator => "Rotator",
            Self::SafetyMonitor => "SafetyMonitor",
            Self::Switch => "Switch",
            Self::Telescope => "Telescope",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownDeviceType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("switch".parse::<DeviceType>().unwrap(), DeviceType::Switch);
        assert_eq!("SWITCH".parse::<DeviceType>().unwrap(), DeviceType::Switch);
        assert_eq!(
            "ObservingConditions".parse::<DeviceType>().unwrap(),
            DeviceType::ObservingConditions
        );
    }

    #[test]
    fn parse_unknown() {
        let err = "toaster".parse::<DeviceType>().unwrap_err();
        assert_eq!(err, ParseError::UnknownDeviceType("toaster".into()));
    }

    #[test]
    fn names_round_trip() {
        for kind in DeviceType::ALL {
            assert_eq!(kind.as_str().parse::<DeviceType>().unwrap(), kind);
            assert_eq!(kind.display_name().to_lowercase(), kind.as_str());
        }
    }
}
