// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Percent-escape repair for raw request bytes.

use std::borrow::Cow;

/// Decodes every `%XY` triplet in `raw` into the byte it encodes.
///
/// The whole request is decoded before it is parsed. Bytes that are not
/// part of a valid escape pass through unchanged, and `+` is left alone.
/// When nothing needs decoding the input is borrowed.
///
/// # Examples
///
/// ```
/// use alpaca_hub::protocol::decode_escapes;
///
/// assert_eq!(&*decode_escapes(b"Brightness=50%2F50"), b"Brightness=50/50");
/// assert_eq!(&*decode_escapes(b"100%"), b"100%");
/// ```
#[must_use]
pub fn decode_escapes(raw: &[u8]) -> Cow<'_, [u8]> {
    if raw.contains(&b'%') {
        urlencoding::decode_binary(raw)
    } else {
        Cow::Borrowed(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_slash() {
        assert_eq!(&*decode_escapes(b"Brightness=50%2F50"), b"Brightness=50/50");
    }

    #[test]
    fn decodes_mixed_case_hex() {
        assert_eq!(&*decode_escapes(b"Name=a%3ab%3Dc"), b"Name=a:b=c");
    }

    #[test]
    fn leaves_plain_bytes() {
        let raw = b"PUT /api/v1/switch/0/setswitch HTTP/1.1";
        assert!(matches!(decode_escapes(raw), Cow::Borrowed(_)));
    }

    #[test]
    fn invalid_escapes_pass_through() {
        assert_eq!(&*decode_escapes(b"a%zzb%4"), b"a%zzb%4");
    }

    #[test]
    fn plus_is_not_a_space() {
        assert_eq!(&*decode_escapes(b"Name=a+b%20c"), b"Name=a+b c");
    }
}
