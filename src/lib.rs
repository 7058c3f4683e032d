//! hearth: a minimal HTTP/1.1 server on a completion-queue worker pool.
//!
//! A single acceptor thread hands new connections to a completion facility;
//! a fixed pool of worker threads drains completions and drives the
//! per-connection receive/parse/respond cycle. No async runtime.
//!
//! ```no_run
//! use hearth::{ContentType, Response, Server, ServerConfig, StatusCode};
//!
//! let mut server = Server::new(ServerConfig::default());
//! server.on_receive(|_request| {
//!     vec![Response::create(StatusCode::Ok, ContentType::Text, "Hello World!")]
//! });
//! server.listen().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod runtime;
pub mod server;

pub use error::ServerError;
pub use http::{ContentType, ContentTypeCategory, Method, Request, Response, StatusCode, Version};
pub use server::{Server, ServerConfig};
