//! Shared completion queue.
//!
//! The reactor pushes one entry per finished receive; worker threads block
//! in `pop` until an entry arrives. `close` is the teardown sentinel: it
//! wakes every blocked worker, and once the backlog drains `pop` returns
//! `None` so the worker loops exit.

use std::collections::VecDeque;
use std::io;
use std::sync::{Condvar, Mutex};

/// Outcome of one posted receive, keyed by connection handle.
///
/// Carries the handle rather than any reference to the connection; a stale
/// handle for an already-freed connection resolves to a no-op at the
/// registry.
#[derive(Debug)]
pub struct Completion {
    pub conn_id: usize,
    /// Bytes received; `Ok(0)` means the peer closed.
    pub result: io::Result<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: VecDeque<Completion>,
    closed: bool,
}

/// Blocking multi-producer multi-consumer queue of completions.
#[derive(Debug, Default)]
pub struct CompletionQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a completion and wake one waiter. Dropped once the queue is
    /// closed; nothing consumes it after teardown begins.
    pub fn push(&self, completion: Completion) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return;
        }
        inner.entries.push_back(completion);
        self.available.notify_one();
    }

    /// Dequeue the next completion, blocking while the queue is empty.
    ///
    /// Returns `None` only when the queue is closed and drained; that is
    /// the signal for a worker to exit.
    pub fn pop(&self) -> Option<Completion> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(completion) = inner.entries.pop_front() {
                return Some(completion);
            }
            if inner.closed {
                return None;
            }
            inner = self.available.wait(inner).unwrap();
        }
    }

    /// Close the queue, waking every blocked waiter. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn completion(conn_id: usize, n: usize) -> Completion {
        Completion {
            conn_id,
            result: Ok(n),
        }
    }

    #[test]
    fn test_pop_preserves_push_order() {
        let queue = CompletionQueue::new();
        queue.push(completion(1, 10));
        queue.push(completion(2, 20));
        queue.push(completion(3, 0));

        assert_eq!(queue.pop().unwrap().conn_id, 1);
        assert_eq!(queue.pop().unwrap().conn_id, 2);
        let last = queue.pop().unwrap();
        assert_eq!(last.conn_id, 3);
        assert_eq!(last.result.unwrap(), 0);
    }

    #[test]
    fn test_close_unblocks_all_waiters() {
        let queue = Arc::new(CompletionQueue::new());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop())
            })
            .collect();

        // Give the waiters time to block in pop.
        thread::sleep(Duration::from_millis(50));
        queue.close();

        for waiter in waiters {
            assert!(waiter.join().unwrap().is_none());
        }
    }

    #[test]
    fn test_backlog_drains_before_closed_signal() {
        let queue = CompletionQueue::new();
        queue.push(completion(7, 42));
        queue.close();

        assert_eq!(queue.pop().unwrap().conn_id, 7);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_push_after_close_is_dropped() {
        let queue = CompletionQueue::new();
        queue.close();
        assert!(queue.is_closed());

        queue.push(completion(1, 1));
        assert!(queue.pop().is_none());
    }
}
