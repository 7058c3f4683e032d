//! Connection state machine and registry.
//!
//! Each connection bundles its socket, a fixed-size receive buffer and the
//! state of its single in-flight operation. Connections live in a slab
//! registry keyed by a stable handle; the completion queue carries the
//! handle, and removal through the registry makes the free path
//! exactly-once by construction.

use mio::net::TcpStream;
use slab::Slab;
use std::sync::{Arc, Mutex};

/// Current state of a connection.
///
/// `Created → Registered → AwaitingCompletion → Completed →
/// AwaitingCompletion` for the steady receive/dispatch cycle;
/// `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Accepted but not yet associated with the poller.
    Created,
    /// Associated with the poller, no operation in flight yet.
    Registered,
    /// A receive has been posted; exactly one operation in flight.
    AwaitingCompletion,
    /// The receive finished with data; being dispatched by a worker.
    Completed,
    /// Peer closed or the operation failed; resources are being released.
    Disconnected,
}

/// A single client connection.
#[derive(Debug)]
pub struct Connection {
    /// Non-blocking client socket, owned exclusively by this connection.
    pub stream: TcpStream,
    /// Fixed-size receive buffer, reused across receives.
    pub buf: Vec<u8>,
    /// Bytes of `buf` filled by the last completed receive.
    pub filled: usize,
    pub state: ConnState,
}

impl Connection {
    pub fn new(stream: TcpStream, buffer_size: usize) -> Self {
        Self {
            stream,
            buf: vec![0u8; buffer_size],
            filled: 0,
            state: ConnState::Created,
        }
    }

    /// The connection has been handed to the poller and the registry.
    pub fn register(&mut self) {
        self.state = ConnState::Registered;
    }

    /// A receive has been posted; wait for its completion.
    pub fn post_receive(&mut self) {
        self.state = ConnState::AwaitingCompletion;
    }

    /// The posted receive finished with `n > 0` bytes.
    pub fn complete(&mut self, n: usize) {
        self.filled = n;
        self.state = ConnState::Completed;
    }

    /// Clear the buffer for reuse and post the next receive.
    ///
    /// The dispatcher must have copied out whatever it needs before this;
    /// the buffer contents are dead once the next receive is in flight.
    pub fn rearm(&mut self) {
        self.filled = 0;
        self.state = ConnState::AwaitingCompletion;
    }

    /// Terminal transition; the socket closes when the connection drops.
    pub fn disconnect(&mut self) {
        self.filled = 0;
        self.state = ConnState::Disconnected;
    }

    /// Whether a receive is in flight for this connection.
    pub fn is_awaiting(&self) -> bool {
        self.state == ConnState::AwaitingCompletion
    }
}

/// Registry of active connections using slab allocation.
///
/// The slab key is the connection handle carried in poll tokens and
/// completions. `remove` returns the connection at most once, so two
/// workers racing on the same disconnect cannot both run the release path.
pub struct ConnectionRegistry {
    connections: Slab<Arc<Mutex<Connection>>>,
    max_connections: usize,
}

impl ConnectionRegistry {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: Slab::with_capacity(max_connections),
            max_connections,
        }
    }

    /// Insert a connection, returning its handle.
    ///
    /// Returns `None` if the registry is at capacity.
    pub fn insert(&mut self, conn: Arc<Mutex<Connection>>) -> Option<usize> {
        if self.connections.len() >= self.max_connections {
            return None;
        }
        Some(self.connections.insert(conn))
    }

    /// Borrow a connection for the duration of one completion.
    pub fn get(&self, id: usize) -> Option<Arc<Mutex<Connection>>> {
        self.connections.get(id).cloned()
    }

    /// Remove a connection. Returns `None` if it was already removed.
    pub fn remove(&mut self, id: usize) -> Option<Arc<Mutex<Connection>>> {
        if self.connections.contains(id) {
            Some(self.connections.remove(id))
        } else {
            None
        }
    }

    pub fn contains(&self, id: usize) -> bool {
        self.connections.contains(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    /// Build a real connected stream; the state machine needs a socket but
    /// never performs I/O in these tests.
    fn loopback_stream() -> TcpStream {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::net::TcpStream::connect(addr).unwrap();
        let _server_side = listener.accept().unwrap();
        client.set_nonblocking(true).unwrap();
        TcpStream::from_std(client)
    }

    #[test]
    fn test_connection_state_transitions() {
        let mut conn = Connection::new(loopback_stream(), 4096);
        assert_eq!(conn.state, ConnState::Created);

        conn.register();
        assert_eq!(conn.state, ConnState::Registered);

        conn.post_receive();
        assert!(conn.is_awaiting());

        conn.complete(17);
        assert_eq!(conn.state, ConnState::Completed);
        assert_eq!(conn.filled, 17);

        conn.rearm();
        assert!(conn.is_awaiting());
        assert_eq!(conn.filled, 0);

        conn.disconnect();
        assert_eq!(conn.state, ConnState::Disconnected);
    }

    #[test]
    fn test_registry_capacity_and_remove_once() {
        let mut registry = ConnectionRegistry::new(2);

        let id1 = registry
            .insert(Arc::new(Mutex::new(Connection::new(loopback_stream(), 64))))
            .unwrap();
        let _id2 = registry
            .insert(Arc::new(Mutex::new(Connection::new(loopback_stream(), 64))))
            .unwrap();

        // At capacity.
        assert!(registry
            .insert(Arc::new(Mutex::new(Connection::new(loopback_stream(), 64))))
            .is_none());
        assert_eq!(registry.len(), 2);

        // Removal is exactly-once.
        assert!(registry.remove(id1).is_some());
        assert!(registry.remove(id1).is_none());
        assert!(!registry.contains(id1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stale_handle_lookup_fails() {
        let mut registry = ConnectionRegistry::new(4);
        let id = registry
            .insert(Arc::new(Mutex::new(Connection::new(loopback_stream(), 64))))
            .unwrap();
        registry.remove(id);

        // A completion holding a freed handle finds nothing to dispatch to.
        assert!(registry.get(id).is_none());
    }
}
