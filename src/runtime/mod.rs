//! Completion-model runtime.
//!
//! The transport realizes the completion facility with a poll loop: the
//! reactor performs posted receives when sockets become readable and feeds
//! a shared completion queue, which a fixed pool of worker threads drains.
//! Shared abstractions:
//! - `CompletionQueue`: blocking queue of finished operations
//! - `Connection`/`ConnectionRegistry`: per-connection state behind stable handles
//! - `dispatch`: parse/handle/serialize glue per completed receive

mod connection;
mod dispatcher;
mod queue;
mod reactor;
mod transport;

pub use connection::{ConnState, Connection, ConnectionRegistry};
pub use dispatcher::{dispatch, Handler};
pub use queue::{Completion, CompletionQueue};
pub use transport::{Callbacks, Transport};
