// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry, tick scheduler and management API.
//!
//! The [`DeviceRegistry`] is the single process context: it owns every
//! device, the server transaction counter and the server identity. The
//! [`Scheduler`] ticks registered devices when they are due. Both are
//! driven from the listener's task; nothing here is shared across
//! threads.
//!
//! # Examples
//!
//! ```
//! use alpaca_hub::manager::{DeviceConfig, DeviceRegistry, Scheduler, ServerInfo};
//! use tokio::time::Instant;
//!
//! let now = Instant::now();
//! let mut registry = DeviceRegistry::new(ServerInfo::default());
//! for device in DeviceConfig::default_set() {
//!     device.register(&mut registry, now);
//! }
//!
//! let mut scheduler = Scheduler::new();
//! assert_eq!(scheduler.run_due(&mut registry, now), 4);
//! ```

mod device_config;
mod management;
mod registry;
mod scheduler;

pub use device_config::{
    CalibratorConfig, CameraConfig, CapabilityPreset, DeviceConfig, FocuserConfig, SwitchConfig,
};
pub use management::API_VERSIONS;
pub use registry::{DeviceRegistry, ServerInfo};
pub use scheduler::{MIN_TICK_DELAY, Scheduler};
