// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state machine types.
//!
//! Each device type owns a small finite state enumeration. Operations that
//! take real time are modelled as a [`Transition`]: a handler records the
//! target state and start instant and returns at once, and the scheduler's
//! tick later completes the transition once enough time has elapsed.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use alpaca_hub::state::{CoverState, Transition};
//! use tokio::time::Instant;
//!
//! let start = Instant::now();
//! let motion = Transition::new(CoverState::Open, start, Duration::from_secs(5));
//!
//! assert!(!motion.is_complete(start + Duration::from_secs(1)));
//! assert!(motion.is_complete(start + Duration::from_secs(5)));
//! assert_eq!(motion.target(), CoverState::Open);
//! ```

mod camera;
mod cover;
mod transition;

pub use camera::CameraState;
pub use cover::{CalibratorState, CoverState};
pub use transition::Transition;
