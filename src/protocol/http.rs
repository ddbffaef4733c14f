// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal HTTP/1.1 framing for one-shot request/response exchanges.

/// Value of the `Server` header.
pub const SERVER_NAME: &str = concat!("alpaca-hub/", env!("CARGO_PKG_VERSION"));

const HEADER_END: &[u8] = b"\r\n\r\n";

/// Status line and headers for a JSON reply with a body of `content_length`
/// bytes.
#[must_use]
pub fn json_header(content_length: usize) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json; charset=utf-8\r\n\
         Content-Length: {content_length}\r\n\
         Connection: close\r\n\
         Server: {SERVER_NAME}\r\n\r\n"
    )
}

/// A complete 400 reply with a plain-text explanation.
#[must_use]
pub fn bad_request(message: &str) -> String {
    format!(
        "HTTP/1.1 400 Bad Request\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         Server: {SERVER_NAME}\r\n\r\n{message}",
        message.len()
    )
}

/// Returns `true` once `buf` holds the full header block and as many body
/// bytes as its `Content-Length` announces.
///
/// Lets the reader stop without waiting for the idle timeout.
#[must_use]
pub fn is_complete(buf: &[u8]) -> bool {
    let Some(end) = find(buf, HEADER_END) else {
        return false;
    };
    let body = buf.len() - (end + HEADER_END.len());
    body >= content_length(&buf[..end]).unwrap_or(0)
}

fn content_length(head: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(head).lines().skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_header_announces_length() {
        let header = json_header(42);
        assert!(header.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(header.contains("Content-Length: 42\r\n"));
        assert!(header.contains("application/json"));
        assert!(header.ends_with("\r\n\r\n"));
    }

    #[test]
    fn bad_request_has_body() {
        let reply = bad_request("Device not found");
        let (head, body) = reply.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.1 400 Bad Request"));
        assert!(head.contains("Content-Length: 16"));
        assert_eq!(body, "Device not found");
    }

    #[test]
    fn get_without_body_is_complete_after_headers() {
        assert!(!is_complete(b"GET /api/v1/switch/0/maxswitch HTTP/1.1\r\nHost: x\r\n"));
        assert!(is_complete(
            b"GET /api/v1/switch/0/maxswitch HTTP/1.1\r\nHost: x\r\n\r\n"
        ));
    }

    #[test]
    fn put_waits_for_body() {
        let head =
            b"PUT /api/v1/covercalibrator/0/calibratoron HTTP/1.1\r\ncontent-length: 14\r\n\r\n";
        let mut buf = head.to_vec();
        assert!(!is_complete(&buf));
        buf.extend_from_slice(b"Brightness");
        assert!(!is_complete(&buf));
        buf.extend_from_slice(b"=100");
        assert!(is_complete(&buf));
    }
}
