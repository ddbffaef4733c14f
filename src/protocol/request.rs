// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded Alpaca requests.
//!
//! Only what dispatch needs is extracted from the HTTP text: the method,
//! the route and the parameter bag. Parameters come from the query string
//! for GET and from the body for PUT, as Alpaca prescribes.

use crate::error::{DeviceError, ParseError};
use crate::types::{DeviceType, Method};

/// Where a request is going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `/api/v1/{devicetype}/{number}/{command}`
    Device {
        /// Device type segment.
        device_type: DeviceType,
        /// Device number segment.
        number: u32,
        /// Command segment, as sent by the client.
        command: String,
    },
    /// One of the `/management` routes.
    Management(ManagementRoute),
}

/// The management API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementRoute {
    /// `/management/apiversions`
    ApiVersions,
    /// `/management/v1/description`
    Description,
    /// `/management/v1/configureddevices`
    ConfiguredDevices,
}

/// A decoded request: method, route and parameters.
///
/// # Examples
///
/// ```
/// use alpaca_hub::protocol::{Request, Target};
/// use alpaca_hub::types::{DeviceType, Method};
///
/// let raw = "PUT /api/v1/covercalibrator/0/calibratoron HTTP/1.1\r\n\
///            Content-Length: 36\r\n\r\n\
///            Brightness=100&ClientTransactionID=9";
/// let request = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method(), Method::Put);
/// assert_eq!(request.params().get("brightness"), Some("100"));
/// assert_eq!(request.client_transaction_id(), 9);
/// assert!(matches!(
///     request.target(),
///     Target::Device { device_type: DeviceType::CoverCalibrator, number: 0, .. }
/// ));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    target: Target,
    params: Params,
}

impl Request {
    /// Builds a device request directly, bypassing HTTP parsing.
    #[must_use]
    pub fn device(
        method: Method,
        device_type: DeviceType,
        number: u32,
        command: impl Into<String>,
        params: Params,
    ) -> Self {
        Self {
            method,
            target: Target::Device {
                device_type,
                number,
                command: command.into(),
            },
            params,
        }
    }

    /// Parses the text of an HTTP request whose escapes are already decoded.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the request line is missing or malformed,
    /// the method is not GET or PUT, or the path is not an Alpaca route.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (head, body) = text
            .split_once("\r\n\r\n")
            .or_else(|| text.split_once("\n\n"))
            .unwrap_or((text, ""));

        let line = head
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or(ParseError::Empty)?;

        let mut parts = line.split_whitespace();
        let (Some(method), Some(uri)) = (parts.next(), parts.next()) else {
            return Err(ParseError::MalformedRequestLine(line.to_string()));
        };
        let method: Method = method.parse()?;

        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        let target = parse_target(path)?;

        let params = match method {
            Method::Get => Params::parse(query),
            Method::Put => Params::parse(body.trim_end_matches(['\r', '\n', '\0'])),
        };

        Ok(Self {
            method,
            target,
            params,
        })
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the route.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the parameter bag.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the client's transaction ID, or 0 when absent or malformed.
    #[must_use]
    pub fn client_transaction_id(&self) -> u32 {
        self.params.unsigned_or_zero("ClientTransactionID")
    }

    /// Returns the client's ID, or 0 when absent or malformed.
    #[must_use]
    pub fn client_id(&self) -> u32 {
        self.params.unsigned_or_zero("ClientID")
    }
}

fn parse_target(path: &str) -> Result<Target, ParseError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let unknown = || ParseError::UnknownRoute(path.to_string());

    match segments.as_slice() {
        [api, version, device_type, number, command]
            if api.eq_ignore_ascii_case("api") && version.eq_ignore_ascii_case("v1") =>
        {
            let device_type: DeviceType = device_type.parse()?;
            let number = number
                .parse::<u32>()
                .map_err(|_| ParseError::InvalidDeviceNumber((*number).to_string()))?;
            Ok(Target::Device {
                device_type,
                number,
                command: (*command).to_string(),
            })
        }
        [management, rest @ ..] if management.eq_ignore_ascii_case("management") => {
            let route = match rest {
                [name] if name.eq_ignore_ascii_case("apiversions") => ManagementRoute::ApiVersions,
                [version, name] if version.eq_ignore_ascii_case("v1") => {
                    if name.eq_ignore_ascii_case("description") {
                        ManagementRoute::Description
                    } else if name.eq_ignore_ascii_case("configureddevices") {
                        ManagementRoute::ConfiguredDevices
                    } else {
                        return Err(unknown());
                    }
                }
                _ => return Err(unknown()),
            };
            Ok(Target::Management(route))
        }
        _ => Err(unknown()),
    }
}

/// The `key=value` parameters of a request.
///
/// Keys are matched case-insensitively, as Alpaca requires. Typed
/// accessors turn a missing key into [`Status::ValueNotSet`] and an
/// unparsable one into [`Status::InvalidValue`], so handlers can use `?`.
///
/// [`Status::ValueNotSet`]: crate::Status::ValueNotSet
/// [`Status::InvalidValue`]: crate::Status::InvalidValue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Parses an `&`-separated list of `key=value` pairs.
    ///
    /// A pair without `=` is kept with an empty value.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let pairs = text
            .split('&')
            .filter(|pair| !pair.trim().is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (key.trim().to_string(), value.trim().to_string())
            })
            .collect();
        Self { pairs }
    }

    /// Builds parameters from explicit pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the raw value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the value for `key` as text.
    ///
    /// # Errors
    ///
    /// Returns a value-not-set error if the key is absent.
    pub fn text(&self, key: &str) -> Result<&str, DeviceError> {
        self.get(key)
            .ok_or_else(|| DeviceError::value_not_set(format!("{key} not specified")))
    }

    /// Returns the value for `key` as a floating-point number.
    ///
    /// A `,` decimal separator is accepted.
    ///
    /// # Errors
    ///
    /// Returns a value-not-set error if the key is absent, or an
    /// invalid-value error if it is not a finite number.
    pub fn number(&self, key: &str) -> Result<f64, DeviceError> {
        let raw = self.text(key)?;
        raw.replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| DeviceError::invalid_value(format!("{key} is not a number: {raw}")))
    }

    /// Returns the value for `key` as an integer.
    ///
    /// # Errors
    ///
    /// Returns a value-not-set error if the key is absent, or an
    /// invalid-value error if it is not an integer.
    pub fn integer(&self, key: &str) -> Result<i64, DeviceError> {
        let raw = self.text(key)?;
        raw.parse()
            .map_err(|_| DeviceError::invalid_value(format!("{key} is not an integer: {raw}")))
    }

    /// Returns the value for `key` as a boolean (`true`/`false`, any case).
    ///
    /// # Errors
    ///
    /// Returns a value-not-set error if the key is absent, or an
    /// invalid-value error for anything other than `true` or `false`.
    pub fn boolean(&self, key: &str) -> Result<bool, DeviceError> {
        let raw = self.text(key)?;
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(DeviceError::invalid_value(format!(
                "{key} is not a boolean: {raw}"
            )))
        }
    }

    fn unsigned_or_zero(&self, key: &str) -> u32 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn parse_get_with_query() {
        let req = Request::parse(
            "GET /api/v1/switch/1/getswitchvalue?Id=3&ClientID=4&ClientTransactionID=12 HTTP/1.1\r\nHost: a\r\n\r\n",
        )
        .unwrap();

        assert_eq!(req.method(), Method::Get);
        assert_eq!(
            req.target(),
            &Target::Device {
                device_type: DeviceType::Switch,
                number: 1,
                command: "getswitchvalue".into(),
            }
        );
        assert_eq!(req.params().get("id"), Some("3"));
        assert_eq!(req.client_id(), 4);
        assert_eq!(req.client_transaction_id(), 12);
    }

    #[test]
    fn put_reads_body_not_query() {
        let req = Request::parse(
            "PUT /api/v1/focuser/0/move?Position=1 HTTP/1.1\r\nContent-Length: 13\r\n\r\nPosition=2000",
        )
        .unwrap();
        assert_eq!(req.params().get("Position"), Some("2000"));
    }

    #[test]
    fn device_type_segment_is_case_insensitive() {
        let req = Request::parse("GET /api/v1/CoverCalibrator/0/CoverState HTTP/1.1\r\n\r\n")
            .unwrap();
        assert!(matches!(
            req.target(),
            Target::Device {
                device_type: DeviceType::CoverCalibrator,
                command,
                ..
            } if command == "CoverState"
        ));
    }

    #[test]
    fn management_routes() {
        let route = |path: &str| {
            Request::parse(&format!("GET {path} HTTP/1.1\r\n\r\n"))
                .unwrap()
                .target()
                .clone()
        };
        assert_eq!(
            route("/management/apiversions"),
            Target::Management(ManagementRoute::ApiVersions)
        );
        assert_eq!(
            route("/management/v1/description"),
            Target::Management(ManagementRoute::Description)
        );
        assert_eq!(
            route("/management/v1/configureddevices"),
            Target::Management(ManagementRoute::ConfiguredDevices)
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Request::parse(""), Err(ParseError::Empty));
        assert_eq!(
            Request::parse("GET\r\n\r\n"),
            Err(ParseError::MalformedRequestLine("GET".into()))
        );
        assert_eq!(
            Request::parse("POST /api/v1/switch/0/maxswitch HTTP/1.1\r\n\r\n"),
            Err(ParseError::UnsupportedMethod("POST".into()))
        );
        assert_eq!(
            Request::parse("GET /api/v1/toaster/0/maxswitch HTTP/1.1\r\n\r\n"),
            Err(ParseError::UnknownDeviceType("toaster".into()))
        );
        assert_eq!(
            Request::parse("GET /api/v1/switch/x/maxswitch HTTP/1.1\r\n\r\n"),
            Err(ParseError::InvalidDeviceNumber("x".into()))
        );
        assert_eq!(
            Request::parse("GET /setup HTTP/1.1\r\n\r\n"),
            Err(ParseError::UnknownRoute("/setup".into()))
        );
        assert_eq!(
            Request::parse("GET /management/v1/unknown HTTP/1.1\r\n\r\n"),
            Err(ParseError::UnknownRoute("/management/v1/unknown".into()))
        );
    }

    #[test]
    fn params_lookup_is_case_insensitive() {
        let params = Params::parse("Brightness=128&connected=True");
        assert_eq!(params.get("BRIGHTNESS"), Some("128"));
        assert_eq!(params.boolean("Connected"), Ok(true));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn params_numbers_accept_comma() {
        let params = Params::parse("Duration=1,5&Bad=abc&Inf=inf");
        assert!((params.number("duration").unwrap() - 1.5).abs() < f64::EPSILON);
        assert_eq!(
            params.number("Bad").unwrap_err().status(),
            Status::InvalidValue
        );
        assert_eq!(
            params.number("Inf").unwrap_err().status(),
            Status::InvalidValue
        );
    }

    #[test]
    fn missing_params_are_value_not_set() {
        let params = Params::default();
        let err = params.integer("Brightness").unwrap_err();
        assert_eq!(err.status(), Status::ValueNotSet);
        assert_eq!(err.message(), "Brightness not specified");
    }

    #[test]
    fn params_skip_empty_pairs() {
        let params = Params::parse("&a=1&&b&");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("b"), Some(""));
        assert!(params.contains("A"));
    }

    #[test]
    fn missing_transaction_ids_are_zero() {
        let req = Request::parse(
            "GET /api/v1/switch/0/maxswitch?ClientTransactionID=abc HTTP/1.1\r\n\r\n",
        )
        .unwrap();
        assert_eq!(req.client_transaction_id(), 0);
        assert_eq!(req.client_id(), 0);
    }
}
