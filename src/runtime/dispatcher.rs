//! Per-completion glue between the transport and the codec.
//!
//! A completed receive is parsed into a request, handed to the registered
//! handler, and the returned responses are serialized for sending. A
//! malformed message is logged and dropped; no response goes out and the
//! connection stays up.

use crate::http::{Request, Response};
use bytes::Bytes;
use tracing::warn;

/// User-supplied request handler.
///
/// Invoked concurrently from any worker thread, so it must be a pure
/// function of its input or synchronize internally.
pub type Handler = dyn Fn(Request) -> Vec<Response> + Send + Sync;

/// Turn one completed receive into zero or more wire messages, in handler
/// order.
pub fn dispatch(raw: &[u8], handler: &Handler) -> Vec<Bytes> {
    let request = match Request::parse(raw) {
        Some(request) => request,
        None => {
            warn!(len = raw.len(), "Dropping malformed request");
            return Vec::new();
        }
    };

    handler(request)
        .iter()
        .map(Response::to_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ContentType, Method, StatusCode};

    #[test]
    fn test_dispatch_serializes_handler_responses_in_order() {
        let handler = |request: Request| {
            assert_eq!(request.method, Method::Get);
            vec![
                Response::create(StatusCode::Ok, ContentType::Text, "one"),
                Response::create(StatusCode::Accepted, ContentType::Text, "two"),
            ]
        };

        let messages = dispatch(b"GET / HTTP/1.1\r\n\r\n", &handler);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(messages[1].starts_with(b"HTTP/1.1 202 Accepted\r\n"));
    }

    #[test]
    fn test_malformed_input_yields_nothing() {
        let handler = |_request: Request| -> Vec<Response> {
            panic!("handler must not run for malformed input");
        };

        assert!(dispatch(b"", &handler).is_empty());
        assert!(dispatch(b"GET /\r\n\r\n", &handler).is_empty());
    }

    #[test]
    fn test_handler_may_return_no_responses() {
        let handler = |_request: Request| Vec::new();
        assert!(dispatch(b"GET / HTTP/1.1\r\n\r\n", &handler).is_empty());
    }
}
