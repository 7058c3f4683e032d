//! HTTP request methods.

/// HTTP request method.
///
/// Unrecognized tokens parse to `Unknown` rather than failing; the request
/// line shape, not the verb, decides whether a message is well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Unknown,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Connect,
    Options,
    Trace,
}

impl Method {
    /// Parse a request-line token. Total: unknown verbs map to `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "CONNECT" => Method::Connect,
            "OPTIONS" => Method::Options,
            "TRACE" => Method::Trace,
            _ => Method::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get | Method::Unknown => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_methods_round_trip() {
        for token in [
            "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "CONNECT", "OPTIONS", "TRACE",
        ] {
            let method = Method::from_token(token);
            assert_ne!(method, Method::Unknown, "{token} should be recognized");
            assert_eq!(method.as_str(), token);
        }
    }

    #[test]
    fn test_unknown_method_is_total() {
        assert_eq!(Method::from_token("FOO"), Method::Unknown);
        assert_eq!(Method::from_token("get"), Method::Unknown);
        assert_eq!(Method::from_token(""), Method::Unknown);
    }
}
