// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera state enumeration.

use std::fmt;

/// Exposure pipeline state reported by `camerastate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraState {
    /// Ready to start an exposure.
    #[default]
    Idle,
    /// Waiting for the exposure to begin.
    Waiting,
    /// Shutter open, integrating.
    Exposing,
    /// Reading the sensor out.
    Reading,
    /// Transferring the image.
    Download,
    /// The camera reported a fault.
    Error,
}

impl CameraState {
    /// Returns the Alpaca numeric value.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Waiting => 1,
            Self::Exposing => 2,
            Self::Reading => 3,
            Self::Download => 4,
            Self::Error => 5,
        }
    }

    /// Returns `true` while an exposure is in progress.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Waiting | Self::Exposing | Self::Reading | Self::Download
        )
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Waiting => "Waiting",
            Self::Exposing => "Exposing",
            Self::Reading => "Reading",
            Self::Download => "Download",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_busy() {
        assert_eq!(CameraState::Idle.code(), 0);
        assert_eq!(CameraState::Reading.code(), 3);
        assert!(CameraState::Exposing.is_busy());
        assert!(!CameraState::Idle.is_busy());
        assert!(!CameraState::Error.is_busy());
    }
}
