// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-driven state transitions.

use std::time::Duration;

use tokio::time::Instant;

/// An in-flight move towards a target state.
///
/// Completion is decided purely by elapsed time against a fixed duration,
/// so it does not matter how often the owning device is ticked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    target: S,
    started: Instant,
    duration: Duration,
}

impl<S: Copy> Transition<S> {
    /// Starts a transition towards `target` at `started`.
    #[must_use]
    pub const fn new(target: S, started: Instant, duration: Duration) -> Self {
        Self {
            target,
            started,
            duration,
        }
    }

    /// Returns the state reached when the transition completes.
    #[must_use]
    pub const fn target(&self) -> S {
        self.target
    }

    /// Returns the instant the transition began.
    #[must_use]
    pub const fn started(&self) -> Instant {
        self.started
    }

    /// Returns the fixed duration of the transition.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Time spent in the transition so far. Never negative.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    /// Returns `true` once `now` is at least `duration` past the start.
    #[must_use]
    pub fn is_complete(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration
    }

    /// Fraction of the transition completed, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed(now).as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_at_duration() {
        let start = Instant::now();
        let t = Transition::new(1_u8, start, Duration::from_millis(500));

        assert!(!t.is_complete(start));
        assert!(!t.is_complete(start + Duration::from_millis(499)));
        assert!(t.is_complete(start + Duration::from_millis(500)));
    }

    #[test]
    fn elapsed_saturates_before_start() {
        let start = Instant::now() + Duration::from_secs(1);
        let t = Transition::new((), start, Duration::from_secs(1));
        assert_eq!(t.elapsed(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn progress_is_clamped() {
        let start = Instant::now();
        let t = Transition::new((), start, Duration::from_secs(4));

        assert!((t.progress(start + Duration::from_secs(1)) - 0.25).abs() < 1e-9);
        assert!((t.progress(start + Duration::from_secs(10)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_is_immediately_complete() {
        let start = Instant::now();
        let t = Transition::new((), start, Duration::ZERO);
        assert!(t.is_complete(start));
        assert!((t.progress(start) - 1.0).abs() < 1e-9);
    }
}
