// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Alpaca device server.
//!
//! Two layers of failure exist side by side:
//!
//! - [`Status`] and [`DeviceError`] are the protocol-level results that
//!   travel back to Alpaca clients inside the JSON envelope. Every device
//!   operation reports through them and the connection always completes.
//! - [`Error`] and its sub-enums cover server-side failures: socket I/O,
//!   configuration loading and requests too malformed to dispatch.

use std::fmt;

use thiserror::Error;

/// The closed set of Alpaca result codes surfaced to clients.
///
/// Device types may not add codes of their own; anything a back-end cannot
/// express with one of these maps to [`Status::FailedUnknown`].
///
/// # Examples
///
/// ```
/// use alpaca_hub::Status;
///
/// assert_eq!(Status::Success.code(), 0);
/// assert_eq!(Status::NotImplemented.code(), 0x400);
/// assert!(Status::InvalidValue.is_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// The operation completed.
    #[default]
    Success,
    /// The device does not implement this property or method.
    NotImplemented,
    /// A parameter was present but out of range or unparsable.
    InvalidValue,
    /// A required parameter was not supplied.
    ValueNotSet,
    /// The hardware behind the device is not connected.
    NotConnected,
    /// The command is unknown or was invoked with the wrong access kind.
    InvalidOperation,
    /// The server itself failed while handling the request.
    InternalError,
    /// A back-end failure with no more specific code.
    FailedUnknown,
}

impl Status {
    /// Returns the numeric Alpaca error number.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NotImplemented => 0x400,
            Self::InvalidValue => 0x401,
            Self::ValueNotSet => 0x402,
            Self::NotConnected => 0x407,
            Self::InvalidOperation => 0x40B,
            Self::InternalError => 0x507,
            Self::FailedUnknown => 0x508,
        }
    }

    /// Returns `true` for every status other than [`Status::Success`].
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Success)
    }

    /// Returns a short human-readable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotImplemented => "not-implemented",
            Self::InvalidValue => "invalid-value",
            Self::ValueNotSet => "value-not-set",
            Self::NotConnected => "not-connected",
            Self::InvalidOperation => "invalid-operation",
            Self::InternalError => "internal-error",
            Self::FailedUnknown => "failed-unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed device operation: the status code plus the message echoed as
/// `ErrorMessage`.
///
/// Handlers build these with the named constructors:
///
/// ```
/// use alpaca_hub::{DeviceError, Status};
///
/// let err = DeviceError::value_not_set("Brightness not specified");
/// assert_eq!(err.status(), Status::ValueNotSet);
/// assert_eq!(err.to_string(), "Brightness not specified");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DeviceError {
    status: Status,
    message: String,
}

impl DeviceError {
    /// Creates an error with an explicit status.
    ///
    /// A [`Status::Success`] status is promoted to
    /// [`Status::FailedUnknown`] so an error can never read as success.
    #[must_use]
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        let status = if status.is_error() {
            status
        } else {
            Status::FailedUnknown
        };
        Self {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for [`Status::NotImplemented`].
    #[must_use]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(Status::NotImplemented, message)
    }

    /// Shorthand for [`Status::InvalidValue`].
    #[must_use]
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(Status::InvalidValue, message)
    }

    /// Shorthand for [`Status::ValueNotSet`].
    #[must_use]
    pub fn value_not_set(message: impl Into<String>) -> Self {
        Self::new(Status::ValueNotSet, message)
    }

    /// Shorthand for [`Status::NotConnected`].
    #[must_use]
    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::new(Status::NotConnected, message)
    }

    /// Shorthand for [`Status::InvalidOperation`].
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(Status::InvalidOperation, message)
    }

    /// Shorthand for [`Status::InternalError`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Status::InternalError, message)
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The main server-side error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A request could not be parsed into something dispatchable.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A device failed while being brought up.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

/// Errors raised while turning raw request bytes into a [`Request`].
///
/// All of these are answered with an HTTP 400 reply rather than a JSON
/// envelope.
///
/// [`Request`]: crate::protocol::Request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The request contained no request line at all.
    #[error("empty request")]
    Empty,

    /// The request line did not have a method, target and version.
    #[error("malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The HTTP method is neither GET nor PUT.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The path does not match any Alpaca route.
    #[error("unknown route: {0}")]
    UnknownRoute(String),

    /// The device type segment is not an Alpaca device type.
    #[error("unknown device type: {0}")]
    UnknownDeviceType(String),

    /// The device number segment is not a non-negative integer.
    #[error("invalid device number: {0}")]
    InvalidDeviceNumber(String),
}

/// Errors raised while loading the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value passed deserialization but is not usable.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type alias for server-side operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_alpaca_numbers() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::NotImplemented.code(), 1024);
        assert_eq!(Status::InvalidValue.code(), 1025);
        assert_eq!(Status::ValueNotSet.code(), 1026);
        assert_eq!(Status::NotConnected.code(), 1031);
        assert_eq!(Status::InvalidOperation.code(), 1035);
        assert_eq!(Status::InternalError.code(), 0x507);
        assert_eq!(Status::FailedUnknown.code(), 0x508);
    }

    #[test]
    fn success_is_not_an_error() {
        assert!(!Status::Success.is_error());
        assert!(Status::NotConnected.is_error());
    }

    #[test]
    fn device_error_never_reports_success() {
        let err = DeviceError::new(Status::Success, "odd");
        assert_eq!(err.status(), Status::FailedUnknown);
        assert_eq!(err.message(), "odd");
    }

    #[test]
    fn device_error_display_is_message() {
        let err = DeviceError::not_implemented("Cover not present");
        assert_eq!(err.to_string(), "Cover not present");
        assert_eq!(err.status(), Status::NotImplemented);
    }

    #[test]
    fn error_display() {
        let err: Error = ParseError::UnknownDeviceType("toaster".into()).into();
        assert_eq!(err.to_string(), "parse error: unknown device type: toaster");

        let err = ConfigError::Invalid {
            field: "port",
            reason: "must not be zero".into(),
        };
        assert_eq!(err.to_string(), "invalid value for port: must not be zero");
    }
}
