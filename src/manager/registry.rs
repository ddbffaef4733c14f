// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The process-wide device registry.

use std::time::Duration;

use tokio::time::Instant;

use super::management;
use crate::device::{AlpacaDevice, DEFAULT_WATCHDOG_TIMEOUT, DeviceInfo, DeviceSlot, Driver};
use crate::protocol::{Reply, Request, Target, decode_escapes};
use crate::response::{DEFAULT_CAPACITY, ResponseBuilder, Trailer};
use crate::types::DeviceType;

/// Identity of the server, reported by `/management/v1/description`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name.
    pub server_name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Manufacturer version.
    pub manufacturer_version: String,
    /// Physical location.
    pub location: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            server_name: "Alpaca Hub".to_string(),
            manufacturer: "alpaca-hub".to_string(),
            manufacturer_version: env!("CARGO_PKG_VERSION").to_string(),
            location: "Observatory".to_string(),
        }
    }
}

/// Every registered device plus the state shared across requests.
///
/// Devices are numbered per type in registration order, starting at 0.
///
/// # Examples
///
/// ```
/// use alpaca_hub::device::CoverCalibrator;
/// use alpaca_hub::manager::{DeviceRegistry, ServerInfo};
/// use alpaca_hub::protocol::Reply;
/// use alpaca_hub::Capabilities;
/// use tokio::time::Instant;
///
/// let now = Instant::now();
/// let mut registry = DeviceRegistry::new(ServerInfo::default());
/// registry.register(CoverCalibrator::simulated(Capabilities::full()), "Flat panel", now);
///
/// let reply = registry.handle_raw(
///     b"GET /api/v1/covercalibrator/0/coverstate?ClientTransactionID=3 HTTP/1.1\r\n\r\n",
///     now,
/// );
/// assert!(reply.body().contains(r#""Value":1"#));
/// assert!(reply.body().contains(r#""ClientTransactionID":3"#));
/// ```
pub struct DeviceRegistry {
    devices: Vec<Box<dyn AlpacaDevice>>,
    info: ServerInfo,
    server_transaction_id: u32,
    response_capacity: usize,
    watchdog: Option<Duration>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(info: ServerInfo) -> Self {
        Self {
            devices: Vec::new(),
            info,
            server_transaction_id: 0,
            response_capacity: DEFAULT_CAPACITY,
            watchdog: Some(DEFAULT_WATCHDOG_TIMEOUT),
        }
    }

    /// Sets the response buffer capacity for every request.
    #[must_use]
    pub fn with_response_capacity(mut self, capacity: usize) -> Self {
        self.response_capacity = capacity;
        self
    }

    /// Sets the watchdog timeout for devices registered afterwards.
    /// `None` disables it.
    #[must_use]
    pub fn with_watchdog(mut self, timeout: Option<Duration>) -> Self {
        self.watchdog = timeout;
        self
    }

    /// Registers a device under `name` and returns its number.
    pub fn register<D: Driver>(&mut self, driver: D, name: impl Into<String>, now: Instant) -> u32 {
        let name = name.into();
        self.register_described(driver, name.clone(), name, now)
    }

    /// Registers a device with an explicit description and returns its
    /// number.
    ///
    /// A hardware initialisation failure is logged; the device stays
    /// registered so clients can still query it.
    pub fn register_described<D: Driver>(
        &mut self,
        driver: D,
        name: impl Into<String>,
        description: impl Into<String>,
        now: Instant,
    ) -> u32 {
        let number = self.next_number(D::DEVICE_TYPE);
        let info = DeviceInfo::new(D::DEVICE_TYPE, number, name).with_description(description);
        let mut slot = DeviceSlot::with_watchdog(driver, info, self.watchdog, now);

        if let Err(err) = slot.init_hardware() {
            tracing::warn!(
                device = %slot.info().name,
                error = %err,
                "Hardware initialisation failed"
            );
        }
        tracing::info!(
            device_type = %D::DEVICE_TYPE,
            number,
            name = %slot.info().name,
            "Device registered"
        );
        self.devices.push(Box::new(slot));
        number
    }

    fn next_number(&self, device_type: DeviceType) -> u32 {
        let count = self
            .devices
            .iter()
            .filter(|d| d.info().device_type == device_type)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if no device is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Server identity.
    #[must_use]
    pub const fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Identities of the registered devices, in registration order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.iter().map(|d| d.info())
    }

    /// Looks a device up by type and number.
    #[must_use]
    pub fn find(&self, device_type: DeviceType, number: u32) -> Option<&dyn AlpacaDevice> {
        self.devices
            .iter()
            .find(|d| d.info().device_type == device_type && d.info().number == number)
            .map(AsRef::as_ref)
    }

    fn find_mut(
        &mut self,
        device_type: DeviceType,
        number: u32,
    ) -> Option<&mut Box<dyn AlpacaDevice>> {
        self.devices
            .iter_mut()
            .find(|d| d.info().device_type == device_type && d.info().number == number)
    }

    /// Last server transaction ID issued.
    #[must_use]
    pub const fn server_transaction_id(&self) -> u32 {
        self.server_transaction_id
    }

    /// Ticks the device at `index` (registration order); `None` if out of
    /// range.
    pub fn tick(&mut self, index: usize, now: Instant) -> Option<Duration> {
        self.devices.get_mut(index).map(|d| d.tick(now))
    }

    /// Decodes, parses and dispatches raw request bytes.
    pub fn handle_raw(&mut self, raw: &[u8], now: Instant) -> Reply {
        let decoded = decode_escapes(raw);
        let text = String::from_utf8_lossy(&decoded);
        match Request::parse(&text) {
            Ok(request) => self.handle(&request, now),
            Err(err) => {
                self.next_transaction_id();
                tracing::debug!(error = %err, "Rejected request");
                Reply::BadRequest(err.to_string())
            }
        }
    }

    /// Dispatches a parsed request and builds its envelope.
    ///
    /// A request for a device that is not registered gets a 400 reply.
    pub fn handle(&mut self, request: &Request, now: Instant) -> Reply {
        let server_id = self.next_transaction_id();
        let client_id = request.client_transaction_id();
        let mut out = ResponseBuilder::with_capacity(self.response_capacity);

        let outcome = match request.target() {
            Target::Management(route) => {
                management::respond(*route, request.method(), self, &mut out)
            }
            Target::Device {
                device_type,
                number,
                ..
            } => {
                let Some(device) = self.find_mut(*device_type, *number) else {
                    tracing::debug!(%device_type, number, "No such device");
                    return Reply::BadRequest(format!(
                        "no {device_type} device with number {number}"
                    ));
                };
                device.dispatch(request, now, &mut out)
            }
        };

        Reply::Json(out.finish(&Trailer::from_outcome(client_id, server_id, &outcome)))
    }

    fn next_transaction_id(&mut self) -> u32 {
        self.server_transaction_id = self.server_transaction_id.wrapping_add(1);
        self.server_transaction_id
    }

    /// Logs the command usage of every device.
    pub fn log_usage(&self) {
        for device in &self.devices {
            let info = device.info();
            let total = device.total_usage();
            tracing::info!(
                device = %info.name,
                device_type = %info.device_type,
                calls = total.calls(),
                errors = total.errors,
                "Command usage"
            );
            for usage in device.usage() {
                tracing::debug!(
                    device = %info.name,
                    command = usage.command,
                    gets = usage.counter.gets,
                    puts = usage.counter.puts,
                    errors = usage.counter.errors,
                    last_status = %usage.counter.last_status,
                    "Command usage"
                );
            }
        }
    }
}
