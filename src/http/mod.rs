//! HTTP/1.1 protocol codec.
//!
//! Pure parsing and serialization over byte slices; no I/O and no state.
//! The runtime hands a completed receive here and gets wire bytes back.

mod content_type;
mod method;
mod request;
mod response;
mod status;
mod version;

pub use content_type::{ContentType, ContentTypeCategory};
pub use method::Method;
pub use request::Request;
pub use response::Response;
pub use status::StatusCode;
pub use version::Version;
