// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device contract and per-device dispatch.
//!
//! A concrete device implements [`Driver`]: a static command table, one
//! handler for its own commands, the getters aggregated by `readall`, and
//! a [`tick`](Driver::tick) that advances its state machine and says how
//! long to wait before the next tick.
//!
//! The registry stores each driver inside a [`DeviceSlot`], which owns the
//! properties every device shares (name, description, connection flag),
//! the usage counters and the watchdog. Slots are type-erased behind
//! [`AlpacaDevice`] so devices of different types live in one list.
//!
//! # Examples
//!
//! ```
//! use alpaca_hub::command::CommandEntry;
//! use alpaca_hub::device::{AlpacaDevice, Call, DeviceInfo, DeviceSlot, Driver, ReadAll};
//! use alpaca_hub::protocol::{Params, Request};
//! use alpaca_hub::response::ResponseBuilder;
//! use alpaca_hub::types::{Access, DeviceType, Method};
//! use alpaca_hub::DeviceError;
//! use tokio::time::Instant;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Gauge {
//!     IsSafe,
//! }
//!
//! struct Monitor;
//!
//! impl Driver for Monitor {
//!     type Command = Gauge;
//!     const DEVICE_TYPE: DeviceType = DeviceType::SafetyMonitor;
//!     const COMMANDS: &'static [CommandEntry<Gauge>] =
//!         &[CommandEntry::new("issafe", Gauge::IsSafe, Access::Get)];
//!
//!     fn handle(&mut self, command: Gauge, call: &mut Call<'_>) -> Result<(), DeviceError> {
//!         match command {
//!             Gauge::IsSafe => call.reply(true),
//!         }
//!         Ok(())
//!     }
//!
//!     fn read_all(&self, fields: &mut ReadAll<'_>) {
//!         fields.add("issafe", true);
//!     }
//! }
//!
//! let now = Instant::now();
//! let info = DeviceInfo::new(DeviceType::SafetyMonitor, 0, "Roof");
//! let mut slot = DeviceSlot::new(Monitor, info, now);
//! let request =
//!     Request::device(Method::Get, DeviceType::SafetyMonitor, 0, "IsSafe", Params::default());
//!
//! let mut out = ResponseBuilder::new();
//! assert!(slot.dispatch(&request, now, &mut out).is_ok());
//! ```

mod calibrator;
mod camera;
mod common;
mod focuser;
mod switch;
mod watchdog;

pub use calibrator::{CalibratorCommand, CalibratorHardware, CoverCalibrator, SimulatedCalibrator};
pub use camera::{CameraCommand, CameraSettings, SimulatedCamera};
pub use common::handle_common;
pub use focuser::{FocuserCommand, FocuserSettings, SimulatedFocuser};
pub use switch::{DEFAULT_SWITCH_COUNT, SimulatedSwitch, SwitchChannel, SwitchCommand};
pub use watchdog::{DEFAULT_WATCHDOG_TIMEOUT, Watchdog};

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use crate::command::{
    self, CommandCounter, CommandEntry, CommandStats, CommandUsage, CommonCommand, Resolved,
};
use crate::error::{DeviceError, Status};
use crate::protocol::{Params, Request, Target};
use crate::response::{ResponseBuilder, VALUE};
use crate::types::{DeviceType, Method};

/// Tick delay for drivers without time-driven states.
pub const DEFAULT_TICK_DELAY: Duration = Duration::from_secs(5);

/// The contract every concrete device implements.
pub trait Driver: Send + 'static {
    /// Symbolic identifiers of the device-specific commands.
    type Command: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The device type served.
    const DEVICE_TYPE: DeviceType;

    /// Device-specific command table. Names are lowercase and unique.
    const COMMANDS: &'static [CommandEntry<Self::Command>];

    /// Alpaca interface version implemented.
    const INTERFACE_VERSION: i32 = 1;

    /// Free-form driver description returned by `driverinfo`.
    const DRIVER_INFO: &'static str = "alpaca-hub simulated device";

    /// Brings the hardware up. Called once at registration.
    ///
    /// # Errors
    ///
    /// Returns the back-end's failure; the device stays registered.
    fn init_hardware(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Handles a device-specific command.
    ///
    /// The method has already been checked against the table.
    ///
    /// # Errors
    ///
    /// Returns the status and message reported to the client.
    fn handle(&mut self, command: Self::Command, call: &mut Call<'_>) -> Result<(), DeviceError>;

    /// Writes every device-specific property for `readall`.
    fn read_all(&self, fields: &mut ReadAll<'_>);

    /// Appends the operational properties reported by `devicestate`.
    fn device_state(&self, _state: &mut Vec<(&'static str, Value)>) {}

    /// Advances the state machine and returns the delay until the next
    /// tick.
    fn tick(&mut self, _now: Instant) -> Duration {
        DEFAULT_TICK_DELAY
    }

    /// Called on `connect` or `connected=true`.
    ///
    /// # Errors
    ///
    /// Returns the back-end's failure; the device stays disconnected.
    fn on_connect(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Called on `disconnect` or `connected=false`.
    ///
    /// # Errors
    ///
    /// Returns the back-end's failure; the device stays connected.
    fn on_disconnect(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Called once when no successful command arrived for the watchdog
    /// period.
    fn on_watchdog_timeout(&mut self) {}

    /// Handles a common command. Override to customise individual common
    /// commands and delegate the rest to [`handle_common`].
    ///
    /// # Errors
    ///
    /// Returns the status and message reported to the client.
    fn handle_common(
        &mut self,
        command: CommonCommand,
        call: &mut Call<'_>,
        props: &mut CommonProperties,
    ) -> Result<(), DeviceError>
    where
        Self: Sized,
    {
        handle_common(self, command, call, props)
    }
}

/// Per-request context handed to handlers.
pub struct Call<'a> {
    method: Method,
    params: &'a Params,
    out: &'a mut ResponseBuilder,
    now: Instant,
}

impl<'a> Call<'a> {
    /// Creates a call context.
    #[must_use]
    pub fn new(
        method: Method,
        params: &'a Params,
        out: &'a mut ResponseBuilder,
        now: Instant,
    ) -> Self {
        Self {
            method,
            params,
            out,
            now,
        }
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        self.params
    }

    /// Time the request is handled at.
    #[must_use]
    pub const fn now(&self) -> Instant {
        self.now
    }

    /// The reply being built.
    pub fn out(&mut self) -> &mut ResponseBuilder {
        self.out
    }

    /// Writes the `Value` member.
    pub fn reply(&mut self, value: impl Into<Value>) {
        self.out.add_value(VALUE, &value.into());
    }
}

/// Collects the members of a `readall` reply.
///
/// A failing getter does not stop the aggregate: members already written
/// stay, and the last failure becomes the status of the whole reply.
pub struct ReadAll<'a> {
    out: &'a mut ResponseBuilder,
    last_error: Option<DeviceError>,
}

impl<'a> ReadAll<'a> {
    /// Starts collecting into `out`.
    #[must_use]
    pub fn new(out: &'a mut ResponseBuilder) -> Self {
        Self {
            out,
            last_error: None,
        }
    }

    /// Writes an infallible property.
    pub fn add(&mut self, key: &str, value: impl Into<Value>) {
        self.out.add_value(key, &value.into());
    }

    /// Writes a property whose getter may fail.
    pub fn add_result<T: Into<Value>>(&mut self, key: &str, value: Result<T, DeviceError>) {
        match value {
            Ok(value) => self.add(key, value),
            Err(err) => {
                tracing::debug!(key, error = %err, "readall getter failed");
                self.last_error = Some(err);
            }
        }
    }

    /// Ends the aggregate, yielding the last failure if any.
    ///
    /// # Errors
    ///
    /// Returns the last getter failure.
    pub fn finish(self) -> Result<(), DeviceError> {
        self.last_error.map_or(Ok(()), Err)
    }
}

/// Identity of a registered device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device type.
    pub device_type: DeviceType,
    /// Index among devices of the same type.
    pub number: u32,
    /// Human-readable name.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Identifier reported by the management API.
    pub unique_id: Uuid,
}

impl DeviceInfo {
    /// Creates device info with a fresh unique ID and the name as
    /// description.
    #[must_use]
    pub fn new(device_type: DeviceType, number: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            device_type,
            number,
            description: name.clone(),
            name,
            unique_id: Uuid::new_v4(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Properties shared by every device, owned by its slot.
#[derive(Debug, Clone)]
pub struct CommonProperties {
    info: DeviceInfo,
    connected: bool,
    driver_version: &'static str,
}

impl CommonProperties {
    fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            connected: false,
            driver_version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Device identity.
    #[must_use]
    pub const fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Whether a client has connected the device.
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.connected
    }

    /// Sets the connection flag.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Version string returned by `driverversion`.
    #[must_use]
    pub const fn driver_version(&self) -> &'static str {
        self.driver_version
    }
}

/// Object-safe view of a registered device.
pub trait AlpacaDevice: Send {
    /// Device identity.
    fn info(&self) -> &DeviceInfo;

    /// Whether a client has connected the device.
    fn is_connected(&self) -> bool;

    /// Brings the hardware up.
    ///
    /// # Errors
    ///
    /// Returns the back-end's failure.
    fn init_hardware(&mut self) -> Result<(), DeviceError>;

    /// Writes the `Device` and `Command` echo, then resolves and runs the
    /// command. The trailer is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns the status reported to the client.
    fn dispatch(
        &mut self,
        request: &Request,
        now: Instant,
        out: &mut ResponseBuilder,
    ) -> Result<(), DeviceError>;

    /// Runs the watchdog and one state-machine tick; returns the delay
    /// until the next tick.
    fn tick(&mut self, now: Instant) -> Duration;

    /// Named usage counters, busiest first.
    fn usage(&self) -> Vec<CommandUsage>;

    /// Usage summed over all commands.
    fn total_usage(&self) -> CommandCounter;
}

/// A driver with the state the framework keeps for it.
pub struct DeviceSlot<D: Driver> {
    driver: D,
    props: CommonProperties,
    stats: CommandStats<D::Command>,
    watchdog: Watchdog,
}

impl<D: Driver> DeviceSlot<D> {
    /// Wraps `driver` with the default watchdog.
    #[must_use]
    pub fn new(driver: D, info: DeviceInfo, now: Instant) -> Self {
        Self::with_watchdog(driver, info, Some(DEFAULT_WATCHDOG_TIMEOUT), now)
    }

    /// Wraps `driver` with an explicit watchdog timeout (`None` disables).
    #[must_use]
    pub fn with_watchdog(
        driver: D,
        info: DeviceInfo,
        watchdog: Option<Duration>,
        now: Instant,
    ) -> Self {
        debug_assert!(command::names_are_unique(D::COMMANDS));
        debug_assert_eq!(info.device_type, D::DEVICE_TYPE);
        Self {
            driver,
            props: CommonProperties::new(info),
            stats: CommandStats::new(),
            watchdog: Watchdog::new(watchdog, now),
        }
    }

    /// The wrapped driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The wrapped driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Usage counters.
    #[must_use]
    pub const fn stats(&self) -> &CommandStats<D::Command> {
        &self.stats
    }

    fn invoke(
        &mut self,
        resolved: Resolved<D::Command>,
        name: &str,
        request: &Request,
        call: &mut Call<'_>,
    ) -> Result<(), DeviceError> {
        if let Some(access) = resolved.access()
            && !access.permits(request.method())
        {
            return Err(DeviceError::invalid_operation(format!(
                "{name} does not accept {}",
                request.method()
            )));
        }

        match resolved {
            Resolved::Device(entry) => self.driver.handle(entry.id, call),
            Resolved::Common(entry) => self.driver.handle_common(entry.id, call, &mut self.props),
            Resolved::Unknown => Err(DeviceError::invalid_operation(format!(
                "Unrecognized command: {name}"
            ))),
        }
    }
}

impl<D: Driver> AlpacaDevice for DeviceSlot<D> {
    fn info(&self) -> &DeviceInfo {
        &self.props.info
    }

    fn is_connected(&self) -> bool {
        self.props.connected
    }

    fn init_hardware(&mut self) -> Result<(), DeviceError> {
        self.driver.init_hardware()
    }

    fn dispatch(
        &mut self,
        request: &Request,
        now: Instant,
        out: &mut ResponseBuilder,
    ) -> Result<(), DeviceError> {
        let name = match request.target() {
            Target::Device { command, .. } => command.as_str(),
            Target::Management(_) => {
                return Err(DeviceError::internal("management request routed to a device"));
            }
        };

        out.add_str("Device", &self.props.info.name);
        out.add_str("Command", name);

        let resolved = command::resolve(D::COMMANDS, name);
        let mut call = Call::new(request.method(), request.params(), out, now);
        let outcome = self.invoke(resolved, name, request, &mut call);

        let status = outcome.as_ref().map_or_else(DeviceError::status, |_| Status::Success);
        self.stats.record(resolved.key(), request.method(), status);
        if outcome.is_ok() {
            self.watchdog.feed(now);
        }

        tracing::debug!(
            device = %self.props.info.name,
            command = name,
            method = %request.method(),
            status = %status,
            "Dispatched command"
        );
        outcome
    }

    fn tick(&mut self, now: Instant) -> Duration {
        if self.watchdog.check(now) {
            tracing::info!(
                device = %self.props.info.name,
                timeout_secs = self.watchdog.timeout().map_or(0, |t| t.as_secs()),
                "Watchdog expired, no valid command received"
            );
            self.driver.on_watchdog_timeout();
        }
        self.driver.tick(now)
    }

    fn usage(&self) -> Vec<CommandUsage> {
        self.stats.usage(D::COMMANDS)
    }

    fn total_usage(&self) -> CommandCounter {
        *self.stats.total()
    }
}
