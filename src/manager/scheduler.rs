// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cooperative tick scheduler.
//!
//! Keeps a next-due instant per device and ticks the ones that are due.
//! Device counts are small, so a linear scan is enough.

use std::time::Duration;

use tokio::time::Instant;

use super::DeviceRegistry;

/// Shortest delay a device may ask for between two ticks.
pub const MIN_TICK_DELAY: Duration = Duration::from_millis(1);

/// Next-due bookkeeping for every registered device.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_due: Vec<Instant>,
}

impl Scheduler {
    /// Creates a scheduler; every device is due on the first run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks every device whose due time has passed and returns how many
    /// were ticked.
    ///
    /// Devices registered since the last run are ticked immediately.
    pub fn run_due(&mut self, registry: &mut DeviceRegistry, now: Instant) -> usize {
        self.next_due.resize(registry.len(), now);

        let mut ticked = 0;
        for (index, due) in self.next_due.iter_mut().enumerate() {
            if *due > now {
                continue;
            }
            if let Some(delay) = registry.tick(index, now) {
                *due = now + delay.max(MIN_TICK_DELAY);
                ticked += 1;
            }
        }
        if ticked > 0 {
            tracing::trace!(ticked, "Devices ticked");
        }
        ticked
    }

    /// Makes every device due at `now`, so transitions started by a
    /// request are picked up on the next run instead of after an idle
    /// delay.
    pub fn wake_all(&mut self, now: Instant) {
        for due in &mut self.next_due {
            *due = (*due).min(now);
        }
    }

    /// Earliest due time, or `None` if no device is known yet.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due.iter().min().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::device::{CoverCalibrator, SimulatedFocuser};
    use crate::manager::ServerInfo;
    use crate::state::CoverState;

    #[test]
    fn empty_registry_has_no_due_time() {
        let mut registry = DeviceRegistry::new(ServerInfo::default());
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.run_due(&mut registry, Instant::now()), 0);
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn devices_follow_their_own_delay() {
        let start = Instant::now();
        let mut registry = DeviceRegistry::new(ServerInfo::default());
        registry.register(CoverCalibrator::simulated(Capabilities::full()), "Panel", start);
        registry.register(SimulatedFocuser::default(), "Focuser", start);

        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.run_due(&mut registry, start), 2);
        // Calibrator idles at 2 s, focuser at 1 s.
        assert_eq!(scheduler.next_due(), Some(start + Duration::from_secs(1)));

        assert_eq!(scheduler.run_due(&mut registry, start + Duration::from_millis(500)), 0);
        assert_eq!(scheduler.run_due(&mut registry, start + Duration::from_secs(1)), 1);
        assert_eq!(scheduler.run_due(&mut registry, start + Duration::from_secs(2)), 2);
    }

    #[test]
    fn wake_all_pulls_due_times_forward() {
        let start = Instant::now();
        let mut registry = DeviceRegistry::new(ServerInfo::default());
        registry.register(CoverCalibrator::simulated(Capabilities::full()), "Panel", start);
        let mut scheduler = Scheduler::new();
        scheduler.run_due(&mut registry, start);

        let request = start + Duration::from_millis(300);
        assert_eq!(scheduler.run_due(&mut registry, request), 0);
        scheduler.wake_all(request);
        assert_eq!(scheduler.next_due(), Some(request));
        assert_eq!(scheduler.run_due(&mut registry, request), 1);
    }

    #[test]
    fn late_registration_is_due_at_once() {
        let start = Instant::now();
        let mut registry = DeviceRegistry::new(ServerInfo::default());
        let mut scheduler = Scheduler::new();
        scheduler.run_due(&mut registry, start);

        registry.register(CoverCalibrator::simulated(Capabilities::full()), "Panel", start);
        assert_eq!(scheduler.run_due(&mut registry, start), 1);
    }

    #[test]
    fn scheduled_ticks_complete_cover_motion() {
        let start = Instant::now();
        let mut registry = DeviceRegistry::new(ServerInfo::default());
        registry.register(CoverCalibrator::simulated(Capabilities::full()), "Panel", start);
        let mut scheduler = Scheduler::new();

        registry.handle_raw(b"PUT /api/v1/covercalibrator/0/opencover HTTP/1.1\r\n\r\n", start);
        let mut now = start;
        while now < start + Duration::from_secs(7) {
            scheduler.run_due(&mut registry, now);
            now = scheduler.next_due().unwrap();
        }

        let reply = registry.handle_raw(
            b"GET /api/v1/covercalibrator/0/coverstate HTTP/1.1\r\n\r\n",
            now,
        );
        let value: serde_json::Value = serde_json::from_str(reply.body()).unwrap();
        assert_eq!(value["Value"], CoverState::Open.code());
    }
}
