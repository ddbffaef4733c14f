// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover and calibrator state enumerations.

use std::fmt;

/// Position of a motorised dust cover.
///
/// The numeric values are the ones Alpaca clients expect from
/// `coverstate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverState {
    /// The unit has no cover.
    NotPresent,
    /// Fully closed.
    Closed,
    /// Travelling towards open or closed.
    Moving,
    /// Fully open.
    Open,
    /// Position not known, for example after a halt.
    Unknown,
    /// The cover reported a fault.
    Error,
}

impl CoverState {
    /// Returns the Alpaca numeric value.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::NotPresent => 0,
            Self::Closed => 1,
            Self::Moving => 2,
            Self::Open => 3,
            Self::Unknown => 4,
            Self::Error => 5,
        }
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotPresent => "NotPresent",
            Self::Closed => "Closed",
            Self::Moving => "Moving",
            Self::Open => "Open",
            Self::Unknown => "Unknown",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for CoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a flat-field light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibratorState {
    /// The unit has no light source.
    NotPresent,
    /// Light is off.
    Off,
    /// Light is warming up and not yet stable.
    NotReady,
    /// Light is on and stable.
    Ready,
    /// State not known.
    Unknown,
    /// The light source reported a fault.
    Error,
}

impl CalibratorState {
    /// Returns the Alpaca numeric value.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::NotPresent => 0,
            Self::Off => 1,
            Self::NotReady => 2,
            Self::Ready => 3,
            Self::Unknown => 4,
            Self::Error => 5,
        }
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotPresent => "NotPresent",
            Self::Off => "Off",
            Self::NotReady => "NotReady",
            Self::Ready => "Ready",
            Self::Unknown => "Unknown",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for CalibratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
