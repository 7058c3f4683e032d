//! HTTP protocol versions.

/// HTTP protocol version.
///
/// Only HTTP/1.1 is served; any other token parses to `Unknown`, which still
/// serializes as HTTP/1.1 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    #[default]
    Http11,
    Unknown,
}

impl Version {
    /// Parse a request-line version token. Total: anything but "HTTP/1.1"
    /// maps to `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "HTTP/1.1" => Version::Http11,
            _ => Version::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        "HTTP/1.1"
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
