// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inactivity watchdog.

use std::time::Duration;

use tokio::time::Instant;

/// Default inactivity period before a device's watchdog trips.
pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Tracks the last successful command and trips once per idle period.
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    timeout: Option<Duration>,
    last_valid: Instant,
    tripped: bool,
}

impl Watchdog {
    /// Creates a watchdog armed at `now`. `None` disables it.
    #[must_use]
    pub const fn new(timeout: Option<Duration>, now: Instant) -> Self {
        Self {
            timeout,
            last_valid: now,
            tripped: false,
        }
    }

    /// Records a successful command and re-arms the watchdog.
    pub fn feed(&mut self, now: Instant) {
        self.last_valid = now;
        self.tripped = false;
    }

    /// Returns `true` exactly once when the idle period has elapsed.
    pub fn check(&mut self, now: Instant) -> bool {
        let Some(timeout) = self.timeout else {
            return false;
        };
        if self.tripped || now.saturating_duration_since(self.last_valid) < timeout {
            return false;
        }
        self.tripped = true;
        true
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
