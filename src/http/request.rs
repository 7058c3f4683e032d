//! HTTP request parsing.

use crate::http::{Method, Version};
use std::collections::HashMap;

/// Parsed view of one HTTP request.
///
/// Fields are owned copies of the receive buffer contents, so a `Request`
/// stays valid after the connection's buffer is cleared for the next receive.
/// The body is raw bytes; only the request line and headers are text.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub version: Version,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    /// Parse one message out of a completed receive.
    ///
    /// Returns `None` ("no request") when the input is empty, the head is
    /// not UTF-8, or the request line does not hold exactly three
    /// space-separated tokens. Unrecognized method or version tokens do not
    /// fail; they map to the `Unknown` variants.
    ///
    /// Header lines split on the first colon with the value trimmed of
    /// surrounding spaces; on duplicate names the last occurrence wins.
    /// Everything after the first blank line is the body, byte for byte with
    /// no decoding, so binary payloads pass through. A message is expected
    /// to arrive in a single receive; there is no reassembly.
    pub fn parse(raw: &[u8]) -> Option<Request> {
        if raw.is_empty() {
            return None;
        }

        let (head, body) = match raw.windows(4).position(|window| window == b"\r\n\r\n") {
            Some(at) => (&raw[..at], &raw[at + 4..]),
            None => (raw, &raw[raw.len()..]),
        };

        let head = std::str::from_utf8(head).ok()?;

        let mut lines = head.split("\r\n");

        // Request line: "<METHOD> <target> <version>"
        let request_line = lines.next()?;
        let tokens: Vec<&str> = request_line.split(' ').collect();
        if tokens.len() != 3 {
            return None;
        }

        let method = Method::from_token(tokens[0]);
        let target = tokens[1].to_string();
        let version = Version::from_token(tokens[2]);

        let mut headers = HashMap::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.to_string(), value.trim().to_string());
            }
        }

        Some(Request {
            method,
            target,
            version,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.target, "/hello");
        assert_eq!(request.version, Version::Http11);
        assert_eq!(request.headers.get("Host").unwrap(), "x");
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_parse_with_body() {
        let raw = b"POST /items HTTP/1.1\r\nContent-Type: application/json\r\n\r\n{\"id\":1}";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.headers.get("Content-Type").unwrap(),
            "application/json"
        );
        assert_eq!(request.body, b"{\"id\":1}".to_vec());
    }

    #[test]
    fn test_empty_input_is_no_request() {
        assert!(Request::parse(b"").is_none());
    }

    #[test]
    fn test_short_request_line_is_no_request() {
        assert!(Request::parse(b"GET /\r\n\r\n").is_none());
        assert!(Request::parse(b"GET\r\n\r\n").is_none());
    }

    #[test]
    fn test_unknown_method_still_parses() {
        let request = Request::parse(b"FOO / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.method, Method::Unknown);
    }

    #[test]
    fn test_unknown_version_still_parses() {
        let request = Request::parse(b"GET / HTTP/9.9\r\n\r\n").unwrap();
        assert_eq!(request.version, Version::Unknown);
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let raw = b"GET / HTTP/1.1\r\nX-Tag: a\r\nX-Tag: b\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.headers.get("X-Tag").unwrap(), "b");
    }

    #[test]
    fn test_header_value_trimmed() {
        let raw = b"GET / HTTP/1.1\r\nHost:   example.com  \r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.headers.get("Host").unwrap(), "example.com");
    }

    #[test]
    fn test_body_taken_verbatim() {
        let raw = b"POST / HTTP/1.1\r\n\r\nline one\r\nline two";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.body, b"line one\r\nline two".to_vec());
    }

    #[test]
    fn test_binary_body_passes_through() {
        let mut raw = b"POST /upload HTTP/1.1\r\nHost: x\r\n\r\n".to_vec();
        let payload = [0x00u8, 0xFF, 0xFE, 0x80, 0x01];
        raw.extend_from_slice(&payload);

        let request = Request::parse(&raw).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.target, "/upload");
        assert_eq!(request.body, payload.to_vec());
    }

    #[test]
    fn test_non_utf8_head_is_no_request() {
        assert!(Request::parse(b"GET /\xFF HTTP/1.1\r\n\r\n").is_none());
    }
}
