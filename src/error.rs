//! Startup error taxonomy.
//!
//! Only initialization failures surface to the caller; every per-connection
//! failure is logged and contained inside the transport.

use std::io;

/// Fatal startup failure. The caller is expected to report it and exit
/// non-zero.
#[derive(Debug)]
pub enum ServerError {
    /// The configured host did not resolve to an address.
    Resolve(String, io::Error),
    /// Listening socket could not be created.
    Socket(io::Error),
    /// Listening socket could not be bound.
    Bind(io::Error),
    /// Listen on the bound socket failed.
    Listen(io::Error),
    /// The poller or its waker could not be created.
    Poller(io::Error),
    /// A reactor or worker thread could not be spawned.
    Spawn(io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Resolve(host, e) => {
                write!(f, "Cannot resolve host '{host}': {e}")
            }
            ServerError::Socket(e) => write!(f, "Cannot create socket: {e}"),
            ServerError::Bind(e) => write!(f, "Cannot bind socket: {e}"),
            ServerError::Listen(e) => write!(f, "Socket listen failed: {e}"),
            ServerError::Poller(e) => write!(f, "Cannot create completion poller: {e}"),
            ServerError::Spawn(e) => write!(f, "Cannot spawn server thread: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Resolve(_, e)
            | ServerError::Socket(e)
            | ServerError::Bind(e)
            | ServerError::Listen(e)
            | ServerError::Poller(e)
            | ServerError::Spawn(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_cause() {
        let e = ServerError::Bind(io::Error::new(io::ErrorKind::AddrInUse, "in use"));
        let text = e.to_string();
        assert!(text.contains("bind"));
        assert!(text.contains("in use"));
    }
}
