// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `alpaca_hub` - an ASCOM Alpaca device server.
//!
//! The crate serves observatory devices over the Alpaca REST protocol from
//! a single task: one connection at a time, with device state machines
//! ticked cooperatively between requests.
//!
//! # Architecture
//!
//! - **Command tables** ([`command`]): each device type maps command names
//!   to identifiers and allowed methods; a shared table covers the
//!   commands every device answers.
//! - **Dispatch** ([`device`]): resolves a command, runs the handler and
//!   wraps its output in the Alpaca JSON envelope ([`response`]).
//! - **Scheduling** ([`manager`]): long operations record a
//!   [`Transition`](state::Transition) and the scheduler completes it when
//!   it is due.
//! - **Transport** ([`protocol`]): a single-connection TCP listener with
//!   percent-decoding and request parsing.
//!
//! # Supported Devices
//!
//! - Cover/calibrator with optional cover, light and adjustable aperture
//! - Switch bank
//! - Absolute focuser
//! - Camera
//!
//! # Quick Start
//!
//! ```no_run
//! use alpaca_hub::config::ServerConfig;
//! use alpaca_hub::protocol::Server;
//! use tokio::time::Instant;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> alpaca_hub::Result<()> {
//!     let config = ServerConfig::default();
//!     let registry = config.build_registry(Instant::now());
//!
//!     let server = Server::bind(config.socket_addr(), registry, config.listener_options()).await?;
//!     let registry = server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!     registry.log_usage();
//!     Ok(())
//! }
//! ```
//!
//! ## Dispatching Without a Socket
//!
//! ```
//! use alpaca_hub::manager::{DeviceRegistry, ServerInfo};
//! use alpaca_hub::device::CoverCalibrator;
//! use alpaca_hub::Capabilities;
//! use tokio::time::Instant;
//!
//! let now = Instant::now();
//! let mut registry = DeviceRegistry::new(ServerInfo::default());
//! registry.register(CoverCalibrator::simulated(Capabilities::full()), "Panel", now);
//!
//! let reply = registry.handle_raw(
//!     b"PUT /api/v1/covercalibrator/0/calibratoron HTTP/1.1\r\n\r\nBrightness=10&ClientTransactionID=7",
//!     now,
//! );
//! let body: serde_json::Value = serde_json::from_str(reply.body()).unwrap();
//! assert_eq!(body["ErrorNumber"], 0);
//! assert_eq!(body["ClientTransactionID"], 7);
//! ```

mod capabilities;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod manager;
pub mod protocol;
pub mod response;
pub mod state;
pub mod types;

pub use capabilities::{Capabilities, CapabilitiesBuilder, DEFAULT_MAX_BRIGHTNESS};
pub use error::{ConfigError, DeviceError, Error, ParseError, Result, Status};
