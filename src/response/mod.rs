// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON envelope construction for Alpaca replies.
//!
//! Every reply is one flat JSON object. Handlers append members through a
//! [`ResponseBuilder`], which keeps the output under a byte budget, and the
//! dispatcher closes the object with the [`Trailer`] that every Alpaca
//! envelope ends with:
//!
//! ```text
//! {"Device":..,"Command":..,<members>,"ClientTransactionID":N,
//!  "ServerTransactionID":N,"ErrorNumber":N,"ErrorMessage":".."}
//! ```

mod builder;

pub use builder::{DEFAULT_CAPACITY, ResponseBuilder};

use crate::error::DeviceError;

/// Key used for the primary result of a single-property request.
pub const VALUE: &str = "Value";

/// The four members that close every envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// Echo of the client's `ClientTransactionID`.
    pub client_transaction_id: u32,
    /// The server's per-request sequence number.
    pub server_transaction_id: u32,
    /// Alpaca error number, zero on success.
    pub error_number: i32,
    /// Error text, empty on success.
    pub error_message: String,
}

impl Trailer {
    /// Creates a success trailer.
    #[must_use]
    pub const fn success(client_transaction_id: u32, server_transaction_id: u32) -> Self {
        Self {
            client_transaction_id,
            server_transaction_id,
            error_number: 0,
            error_message: String::new(),
        }
    }

    /// Creates a trailer describing the outcome of a dispatch.
    #[must_use]
    pub fn from_outcome(
        client_transaction_id: u32,
        server_transaction_id: u32,
        outcome: &Result<(), DeviceError>,
    ) -> Self {
        match outcome {
            Ok(()) => Self::success(client_transaction_id, server_transaction_id),
            Err(err) => Self {
                client_transaction_id,
                server_transaction_id,
                error_number: err.status().code(),
                error_message: err.message().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn trailer_from_error() {
        let outcome = Err(DeviceError::invalid_value("Brightness out of range"));
        let trailer = Trailer::from_outcome(7, 42, &outcome);

        assert_eq!(trailer.client_transaction_id, 7);
        assert_eq!(trailer.server_transaction_id, 42);
        assert_eq!(trailer.error_number, Status::InvalidValue.code());
        assert_eq!(trailer.error_message, "Brightness out of range");
    }

    #[test]
    fn trailer_from_success() {
        let trailer = Trailer::from_outcome(1, 2, &Ok(()));
        assert_eq!(trailer, Trailer::success(1, 2));
    }
}
