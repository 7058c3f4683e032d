//! HTTP response construction and serialization.

use crate::http::{ContentType, ContentTypeCategory, StatusCode, Version};
use bytes::Bytes;

/// One HTTP response to send.
///
/// Headers are kept in insertion order; serialization emits them in the
/// order they were added, which keeps golden-output tests stable.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: Version,
    pub status: StatusCode,
    headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    /// Build a response from a status, a content-type tag and a body.
    ///
    /// `Content-Type` is derived from the tag. `Content-Length` is added for
    /// Text content always, and for Application content only when the tag is
    /// JSON; other categories leave it to the caller.
    pub fn create(status: StatusCode, content_type: ContentType, body: impl Into<String>) -> Self {
        let body = body.into();
        let mut response = Response {
            version: Version::Http11,
            status,
            headers: Vec::new(),
            body,
        };

        response.add_header("Content-Type", content_type.mime());

        let needs_length = match content_type.category() {
            ContentTypeCategory::Text => true,
            ContentTypeCategory::Application => content_type == ContentType::Json,
            _ => false,
        };
        if needs_length {
            let length = response.body.len().to_string();
            response.add_header("Content-Length", length);
        }

        response
    }

    /// Append a header. Emission order follows insertion order.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Look up the last value added for a header name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize to wire bytes: status line, headers, blank line, body,
    /// all joined with CRLF.
    pub fn to_bytes(&self) -> Bytes {
        let mut segments: Vec<String> = Vec::with_capacity(self.headers.len() + 3);

        segments.push(format!(
            "{} {} {}",
            self.version.as_str(),
            self.status.code(),
            self.status.reason()
        ));
        for (name, value) in &self.headers {
            segments.push(format!("{name}: {value}"));
        }
        segments.push(String::new());
        segments.push(self.body.clone());

        Bytes::from(segments.join("\r\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response_wire_format() {
        let response = Response::create(StatusCode::Ok, ContentType::Text, "Hello World!");
        let wire = response.to_bytes();
        let text = std::str::from_utf8(&wire).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 12"));
        assert!(text.ends_with("\r\n\r\nHello World!"));
    }

    #[test]
    fn test_content_length_for_text_matches_byte_len() {
        let response = Response::create(StatusCode::Ok, ContentType::Html, "<p>héllo</p>");
        let expected = "<p>héllo</p>".len().to_string();
        assert_eq!(response.header("Content-Length").unwrap(), expected);
    }

    #[test]
    fn test_content_length_for_json() {
        let response = Response::create(StatusCode::Created, ContentType::Json, "{}");
        assert_eq!(response.header("Content-Length").unwrap(), "2");
    }

    #[test]
    fn test_no_content_length_for_image() {
        let response = Response::create(StatusCode::Ok, ContentType::Png, "");
        assert!(response.header("Content-Length").is_none());
    }

    #[test]
    fn test_no_content_length_for_non_json_application() {
        let response = Response::create(StatusCode::Ok, ContentType::Pdf, "%PDF");
        assert!(response.header("Content-Length").is_none());
    }

    #[test]
    fn test_header_emission_order_is_stable() {
        let mut response = Response::create(StatusCode::Found, ContentType::Text, "");
        response.add_header("Location", "http://localhost/next");

        let wire = response.to_bytes();
        let text = std::str::from_utf8(&wire).unwrap();
        let type_pos = text.find("Content-Type").unwrap();
        let length_pos = text.find("Content-Length").unwrap();
        let location_pos = text.find("Location").unwrap();

        assert!(type_pos < length_pos);
        assert!(length_pos < location_pos);
    }

    #[test]
    fn test_empty_body_ends_with_blank_line() {
        let response = Response::create(StatusCode::NoContent, ContentType::Text, "");
        let wire = response.to_bytes();
        assert!(wire.ends_with(b"\r\n\r\n"));
    }
}
