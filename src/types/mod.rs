// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the server.
//!
//! # Types
//!
//! - [`DeviceType`] - Alpaca device category (camera, switch, ...)
//! - [`Method`] - Request method (GET or PUT)
//! - [`Access`] - Methods a command accepts

mod device_type;
mod method;

pub use device_type::DeviceType;
pub use method::{Access, Method};
