// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request methods and command access kinds.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The HTTP method of an Alpaca request.
///
/// Alpaca reads properties with GET and sets properties or invokes
/// methods with PUT; nothing else is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a property.
    Get,
    /// Write a property or invoke an action.
    Put,
}

impl Method {
    /// Returns the HTTP token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            other => Err(ParseError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Which methods a command table entry accepts.
///
/// # Examples
///
/// ```
/// use alpaca_hub::types::{Access, Method};
///
/// assert!(Access::Get.permits(Method::Get));
/// assert!(!Access::Get.permits(Method::Put));
/// assert!(Access::Both.permits(Method::Put));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Read-only property.
    Get,
    /// Write-only property or method.
    Put,
    /// Read/write property.
    Both,
}

impl Access {
    /// Returns `true` if a request with `method` may invoke the command.
    #[must_use]
    pub const fn permits(self, method: Method) -> bool {
        matches!(
            (self, method),
            (Self::Both, _) | (Self::Get, Method::Get) | (Self::Put, Method::Put)
        )
    }
}
