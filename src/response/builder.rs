// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded, order-preserving JSON object builder.

use serde_json::Value;

use super::Trailer;

/// Default byte budget for the members of one reply.
pub const DEFAULT_CAPACITY: usize = 16 * 1024;

/// Incrementally composes the members of a JSON object.
///
/// Members keep their insertion order and are serialized as they are
/// appended, so delimiters are only placed when the object is finished.
/// Each append is checked against the byte budget: a member that would
/// overflow it is dropped and the builder is marked truncated, but later
/// smaller members may still fit. The trailer written by [`finish`] is
/// outside the budget, so the result is always a complete object.
///
/// # Examples
///
/// ```
/// use alpaca_hub::response::{ResponseBuilder, Trailer};
///
/// let mut out = ResponseBuilder::new();
/// out.add_str("Device", "Flat panel");
/// out.add_int("Value", 128);
///
/// let json = out.finish(&Trailer::success(3, 17));
/// assert_eq!(
///     json,
///     r#"{"Device":"Flat panel","Value":128,"ClientTransactionID":3,"ServerTransactionID":17,"ErrorNumber":0,"ErrorMessage":""}"#
/// );
/// ```
///
/// [`finish`]: ResponseBuilder::finish
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    members: Vec<String>,
    len: usize,
    capacity: usize,
    truncated: bool,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    /// Creates a builder with [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a builder that holds at most `capacity` bytes of members,
    /// separators included.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Vec::new(),
            len: 0,
            capacity,
            truncated: false,
        }
    }

    /// Appends a string member.
    ///
    /// Returns `false` if the member was dropped for lack of space.
    pub fn add_str(&mut self, key: &str, value: &str) -> bool {
        self.push(key, &Value::from(value))
    }

    /// Appends an integer member.
    pub fn add_int(&mut self, key: &str, value: i64) -> bool {
        self.push(key, &Value::from(value))
    }

    /// Appends a floating-point member. Non-finite values become `null`.
    pub fn add_f64(&mut self, key: &str, value: f64) -> bool {
        self.push(key, &Value::from(value))
    }

    /// Appends a boolean member.
    pub fn add_bool(&mut self, key: &str, value: bool) -> bool {
        self.push(key, &Value::from(value))
    }

    /// Appends an arbitrary JSON value, such as an array or nested object.
    pub fn add_value(&mut self, key: &str, value: &Value) -> bool {
        self.push(key, value)
    }

    fn push(&mut self, key: &str, value: &Value) -> bool {
        let member = format!("{}:{value}", Value::from(key));
        let needed = member.len() + usize::from(!self.members.is_empty());

        if self.len + needed > self.capacity {
            self.truncated = true;
            tracing::warn!(
                key,
                size = needed,
                capacity = self.capacity,
                "Response member dropped, buffer full"
            );
            return false;
        }

        self.len += needed;
        self.members.push(member);
        true
    }

    /// Number of bytes used by the members so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no member has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the byte budget.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if any member was dropped for lack of space.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Closes the object with the transaction and error trailer.
    #[must_use]
    pub fn finish(self, trailer: &Trailer) -> String {
        let mut json = String::with_capacity(self.len + 128);
        json.push('{');
        for member in &self.members {
            json.push_str(member);
            json.push(',');
        }
        json.push_str(&format!(
            "\"ClientTransactionID\":{},\"ServerTransactionID\":{},\"ErrorNumber\":{},\"ErrorMessage\":{}",
            trailer.client_transaction_id,
            trailer.server_transaction_id,
            trailer.error_number,
            Value::from(trailer.error_message.as_str()),
        ));
        json.push('}');
        json
    }
}
