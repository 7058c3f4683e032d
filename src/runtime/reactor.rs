//! Readiness-to-completion translation.
//!
//! One thread owns the poller. When a connection with a posted receive
//! becomes readable, the reactor performs the read into that connection's
//! buffer and pushes the outcome onto the completion queue, where a worker
//! picks it up. Receives are one-shot: a connection only produces another
//! event after a worker re-posts it, so at most one operation is ever in
//! flight per connection.

use crate::runtime::{Completion, CompletionQueue, ConnectionRegistry};
use mio::{Events, Interest, Poll, Registry, Token};
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, trace};

/// Token reserved for the teardown waker; slab handles start at zero and
/// never collide with it.
pub const WAKER_TOKEN: Token = Token(usize::MAX);

const EVENT_CAPACITY: usize = 256;

pub fn run(
    mut poll: Poll,
    poller: Arc<Registry>,
    connections: Arc<Mutex<ConnectionRegistry>>,
    queue: Arc<CompletionQueue>,
    ready: Arc<AtomicBool>,
) {
    let mut events = Events::with_capacity(EVENT_CAPACITY);

    loop {
        if let Err(e) = poll.poll(&mut events, None) {
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            error!(error = %e, "Poll failed, stopping reactor");
            queue.close();
            return;
        }

        for event in events.iter() {
            if event.token() == WAKER_TOKEN {
                if !ready.load(Ordering::Acquire) {
                    debug!("Reactor stopping");
                    return;
                }
                continue;
            }

            let conn_id = event.token().0;
            receive(conn_id, &poller, &connections, &queue);
        }
    }
}

/// Perform the posted receive for a readable connection.
fn receive(
    conn_id: usize,
    poller: &Registry,
    connections: &Arc<Mutex<ConnectionRegistry>>,
    queue: &Arc<CompletionQueue>,
) {
    // Borrow through the registry; a stale event for a freed handle is a no-op.
    let conn = match connections.lock().unwrap().get(conn_id) {
        Some(conn) => conn,
        None => {
            trace!(conn_id, "Event for freed connection");
            return;
        }
    };

    let mut guard = conn.lock().unwrap();
    if !guard.is_awaiting() {
        trace!(conn_id, "Event without posted receive");
        return;
    }

    let conn = &mut *guard;
    match conn.stream.read(&mut conn.buf) {
        Ok(n) => {
            if n > 0 {
                conn.complete(n);
            }
            queue.push(Completion {
                conn_id,
                result: Ok(n),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::Interrupted => {
            // Spurious wakeup consumed the edge; re-arm so the data still
            // triggers an event when it arrives.
            if let Err(e) = poller.reregister(&mut conn.stream, Token(conn_id), Interest::READABLE)
            {
                queue.push(Completion {
                    conn_id,
                    result: Err(e),
                });
            }
        }
        Err(e) => {
            queue.push(Completion {
                conn_id,
                result: Err(e),
            });
        }
    }
}
