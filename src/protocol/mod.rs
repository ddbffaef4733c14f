// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The wire side of the server.
//!
//! Raw bytes from a socket are percent-decoded ([`decode_escapes`]),
//! parsed into a [`Request`], dispatched by the registry, and the
//! resulting [`Reply`] is framed as a one-shot HTTP/1.1 response.
//!
//! # Components
//!
//! - [`Request`], [`Params`], [`Target`]: decoded request
//! - [`http`]: response headers and request completeness detection
//! - [`Server`]: single-connection accept loop sharing its task with the
//!   device scheduler

pub mod http;
mod listener;
mod percent;
mod request;

pub use listener::{ListenerOptions, Server};
pub use percent::decode_escapes;
pub use request::{ManagementRoute, Params, Request, Target};

/// What the server sends back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A complete JSON envelope.
    Json(String),
    /// The request could not be routed; the text explains why.
    BadRequest(String),
}

impl Reply {
    /// The body text.
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::Json(body) | Self::BadRequest(body) => body,
        }
    }

    /// Returns `true` for a JSON envelope.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// Frames the reply as a full HTTP response.
    ///
    /// # Examples
    ///
    /// ```
    /// use alpaca_hub::protocol::Reply;
    ///
    /// let wire = Reply::Json("{}".to_string()).into_http();
    /// assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
    /// assert!(wire.ends_with("\r\n\r\n{}"));
    /// ```
    #[must_use]
    pub fn into_http(self) -> String {
        match self {
            Self::Json(body) => {
                let mut wire = http::json_header(body.len());
                wire.push_str(&body);
                wire
            }
            Self::BadRequest(message) => http::bad_request(&message),
        }
    }
}
