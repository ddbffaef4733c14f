// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration.
//!
//! Loaded from a TOML file with a `[server]` table and any number of
//! `[[device]]` tables. Every key has a default; a file without
//! `[[device]]` tables, like no file at all, serves one simulator of each
//! type.
//!
//! ```toml
//! [server]
//! port = 11111
//! location = "Roll-off roof"
//! watchdog_secs = 0
//!
//! [[device]]
//! type = "covercalibrator"
//! name = "Flat panel"
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use crate::error::ConfigError;
use crate::manager::{DeviceConfig, DeviceRegistry, ServerInfo};
use crate::protocol::ListenerOptions;
use crate::response::DEFAULT_CAPACITY;

/// Default Alpaca port.
pub const DEFAULT_PORT: u16 = 6800;

/// Everything needed to start a server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Transport and identity settings.
    pub server: ServerSection,
    /// Devices to serve.
    #[serde(rename = "device")]
    pub devices: Vec<DeviceConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            devices: DeviceConfig::default_set(),
        }
    }
}

/// The `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// TCP port.
    pub port: u16,
    /// Address to bind.
    pub bind: IpAddr,
    /// Idle time allowed between two reads of a request, in milliseconds.
    pub read_timeout_ms: u64,
    /// Requests are cut at this many bytes.
    pub max_request_bytes: usize,
    /// Byte budget of a reply's members.
    pub response_capacity: usize,
    /// Inactivity period before a device's watchdog trips, in seconds.
    /// Zero disables the watchdog.
    pub watchdog_secs: u64,
    /// Reported server name.
    pub server_name: String,
    /// Reported manufacturer.
    pub manufacturer: String,
    /// Reported location.
    pub location: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        let info = ServerInfo::default();
        let listener = ListenerOptions::default();
        Self {
            port: DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            read_timeout_ms: u64::try_from(listener.read_timeout.as_millis()).unwrap_or(u64::MAX),
            max_request_bytes: listener.max_request_bytes,
            response_capacity: DEFAULT_CAPACITY,
            watchdog_secs: 300,
            server_name: info.server_name,
            manufacturer: info.manufacturer,
            location: info.location,
        }
    }
}

impl ServerConfig {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Toml`] if it does not match the schema, or
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(
            path = %path.display(),
            devices = config.devices.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] or [`ConfigError::Invalid`].
    ///
    /// # Examples
    ///
    /// ```
    /// use alpaca_hub::config::ServerConfig;
    ///
    /// let config = ServerConfig::from_toml("[server]\nport = 11111\n").unwrap();
    /// assert_eq!(config.server.port, 11111);
    /// assert_eq!(config.devices.len(), 4);
    /// ```
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        if server.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "read_timeout_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        if server.max_request_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_request_bytes",
                reason: "must be at least 1".to_string(),
            });
        }
        if server.response_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "response_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        self.devices.iter().try_for_each(DeviceConfig::validate)
    }

    /// Address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind, self.server.port)
    }

    /// Transport limits.
    #[must_use]
    pub const fn listener_options(&self) -> ListenerOptions {
        ListenerOptions {
            read_timeout: Duration::from_millis(self.server.read_timeout_ms),
            max_request_bytes: self.server.max_request_bytes,
        }
    }

    /// Watchdog timeout, `None` when disabled.
    #[must_use]
    pub const fn watchdog(&self) -> Option<Duration> {
        match self.server.watchdog_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Server identity for the management API.
    #[must_use]
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            server_name: self.server.server_name.clone(),
            manufacturer: self.server.manufacturer.clone(),
            location: self.server.location.clone(),
            ..ServerInfo::default()
        }
    }

    /// Creates the registry and registers every configured device.
    #[must_use]
    pub fn build_registry(&self, now: Instant) -> DeviceRegistry {
        let mut registry = DeviceRegistry::new(self.server_info())
            .with_response_capacity(self.server.response_capacity)
            .with_watchdog(self.watchdog());
        for device in &self.devices {
            device.register(&mut registry, now);
        }
        registry
    }
}
