//! Completion-based socket transport.
//!
//! Owns the listening socket, the completion queue, the reactor and the
//! worker pool. One acceptor (the caller of `accept_loop`) hands new
//! connections to the poller; N workers drain the shared completion queue
//! and drive the receive/dispatch/send cycle per connection.

use crate::error::ServerError;
use crate::runtime::reactor::{self, WAKER_TOKEN};
use crate::runtime::{dispatch, Completion, CompletionQueue, Connection, ConnectionRegistry, Handler};
use crate::server::ServerConfig;
use mio::{Interest, Poll, Registry, Token, Waker};
use std::io::{self, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

const LISTEN_BACKLOG: i32 = 1024;

/// Callback set shared by the accept loop and the workers.
///
/// Every callback may be invoked concurrently from multiple threads and
/// must be safe under concurrent invocation.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_connect: Option<Arc<dyn Fn() + Send + Sync>>,
    pub on_disconnect: Option<Arc<dyn Fn() + Send + Sync>>,
    pub on_receive: Option<Arc<Handler>>,
}

/// Completion-based socket server.
pub struct Transport {
    listener: std::net::TcpListener,
    local_addr: SocketAddr,
    buffer_size: usize,
    connections: Arc<Mutex<ConnectionRegistry>>,
    poller: Arc<Registry>,
    queue: Arc<CompletionQueue>,
    waker: Waker,
    ready: Arc<AtomicBool>,
    callbacks: Callbacks,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Transport {
    /// Create the completion machinery, bind the listener and start the
    /// reactor plus `config.workers` worker threads.
    ///
    /// Any failure here is an unrecoverable configuration error.
    pub fn bind(config: &ServerConfig, callbacks: Callbacks) -> Result<Transport, ServerError> {
        let addr = resolve(&config.host, config.port)?;
        let listener = create_listener(addr)?;
        let local_addr = listener.local_addr().map_err(ServerError::Socket)?;

        let poll = Poll::new().map_err(ServerError::Poller)?;
        let waker = Waker::new(poll.registry(), WAKER_TOKEN).map_err(ServerError::Poller)?;
        let poller = Arc::new(poll.registry().try_clone().map_err(ServerError::Poller)?);

        let queue = Arc::new(CompletionQueue::new());
        let connections = Arc::new(Mutex::new(ConnectionRegistry::new(config.max_connections)));
        let ready = Arc::new(AtomicBool::new(true));

        let mut threads = Vec::with_capacity(config.workers + 1);

        {
            let poller = Arc::clone(&poller);
            let connections = Arc::clone(&connections);
            let queue = Arc::clone(&queue);
            let ready = Arc::clone(&ready);
            let handle = thread::Builder::new()
                .name("reactor".to_string())
                .spawn(move || reactor::run(poll, poller, connections, queue, ready))
                .map_err(ServerError::Spawn)?;
            threads.push(handle);
        }

        for worker_id in 0..config.workers {
            let queue = Arc::clone(&queue);
            let connections = Arc::clone(&connections);
            let poller = Arc::clone(&poller);
            let callbacks = callbacks.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, queue, connections, poller, callbacks))
                .map_err(ServerError::Spawn)?;
            threads.push(handle);
        }

        info!(
            addr = %local_addr,
            workers = config.workers,
            buffer_size = config.buffer_size,
            "Transport initialized"
        );

        Ok(Transport {
            listener,
            local_addr,
            buffer_size: config.buffer_size,
            connections,
            poller,
            queue,
            waker,
            ready,
            callbacks,
            threads: Mutex::new(threads),
        })
    }

    /// Address the listener is bound to. Differs from the configured one
    /// when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block on accept, setting up each new connection.
    ///
    /// Runs on the caller's thread until `terminate`. A failed accept is
    /// logged and the loop continues; it is never fatal.
    pub fn accept_loop(&self) {
        info!(addr = %self.local_addr, "Accepting connections");

        while self.ready.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = self.setup_connection(stream, peer) {
                        warn!(peer = %peer, error = %e, "Failed to set up connection");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // terminate shuts the listener down to break this call;
                    // that error is the exit signal, not a failure.
                    if !self.ready.load(Ordering::Acquire) {
                        break;
                    }
                    warn!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Allocate a connection, register it with the poller and post its
    /// initial receive, then fire `on_connect`.
    fn setup_connection(&self, stream: std::net::TcpStream, peer: SocketAddr) -> io::Result<()> {
        stream.set_nonblocking(true)?;
        let stream = mio::net::TcpStream::from_std(stream);

        let conn = Arc::new(Mutex::new(Connection::new(stream, self.buffer_size)));
        let conn_id = match self.connections.lock().unwrap().insert(Arc::clone(&conn)) {
            Some(id) => id,
            None => {
                warn!(peer = %peer, "Connection limit reached, closing");
                return Ok(());
            }
        };

        {
            let mut guard = conn.lock().unwrap();
            guard.register();
            guard.post_receive();
            if let Err(e) =
                self.poller
                    .register(&mut guard.stream, Token(conn_id), Interest::READABLE)
            {
                guard.disconnect();
                drop(guard);
                self.connections.lock().unwrap().remove(conn_id);
                return Err(e);
            }
        }

        debug!(conn_id, peer = %peer, "Accepted connection");

        if let Some(on_connect) = &self.callbacks.on_connect {
            on_connect();
        }

        Ok(())
    }

    /// Idempotent teardown: mark not-ready, shut the listener down so a
    /// blocked accept returns, close the queue so blocked workers wake up
    /// and exit, wake the reactor, and join all threads.
    pub fn terminate(&self) {
        if !self.ready.swap(false, Ordering::AcqRel) {
            return;
        }

        // accept(2) does not observe the flag on its own; shutting the
        // listening socket down makes the blocked call return an error.
        unsafe {
            libc::shutdown(self.listener.as_raw_fd(), libc::SHUT_RDWR);
        }

        self.queue.close();
        let _ = self.waker.wake();

        let mut threads = self.threads.lock().unwrap();
        for handle in threads.drain(..) {
            let _ = handle.join();
        }

        info!("Transport terminated");
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| ServerError::Resolve(host.to_string(), e))?;
    addrs.next().ok_or_else(|| {
        ServerError::Resolve(
            host.to_string(),
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved"),
        )
    })
}

/// Create a blocking TCP listener with SO_REUSEADDR.
fn create_listener(addr: SocketAddr) -> Result<std::net::TcpListener, ServerError> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )
    .map_err(ServerError::Socket)?;

    socket.set_reuse_address(true).map_err(ServerError::Socket)?;
    socket.bind(&addr.into()).map_err(ServerError::Bind)?;
    socket.listen(LISTEN_BACKLOG).map_err(ServerError::Listen)?;

    Ok(socket.into())
}

/// Completion-drain loop run by each worker thread.
fn worker_loop(
    worker_id: usize,
    queue: Arc<CompletionQueue>,
    connections: Arc<Mutex<ConnectionRegistry>>,
    poller: Arc<Registry>,
    callbacks: Callbacks,
) {
    debug!(worker = worker_id, "Worker started");

    while let Some(completion) = queue.pop() {
        handle_completion(completion, &connections, &poller, &callbacks);
    }

    debug!(worker = worker_id, "Worker stopped");
}

fn handle_completion(
    completion: Completion,
    connections: &Arc<Mutex<ConnectionRegistry>>,
    poller: &Registry,
    callbacks: &Callbacks,
) {
    let Completion { conn_id, result } = completion;

    let n = match result {
        Ok(0) => {
            debug!(conn_id, "Connection closed by peer");
            close_connection(connections, poller, callbacks, conn_id);
            return;
        }
        Ok(n) => n,
        Err(e) => {
            debug!(conn_id, error = %e, "Receive failed");
            close_connection(connections, poller, callbacks, conn_id);
            return;
        }
    };

    let conn = match connections.lock().unwrap().get(conn_id) {
        Some(conn) => conn,
        None => return,
    };

    // Copy the filled bytes out and release the lock before running the
    // handler. The reactor takes this mutex on every readable event, so
    // holding it across a slow handler would stall the whole poll loop.
    // No other worker can touch the connection meanwhile: its single
    // in-flight operation is the completion this worker is handling.
    let raw = {
        let guard = conn.lock().unwrap();
        let n = n.min(guard.buf.len());
        guard.buf[..n].to_vec()
    };

    let messages = match &callbacks.on_receive {
        Some(handler) => dispatch(&raw, handler.as_ref()),
        None => Vec::new(),
    };

    let mut guard = conn.lock().unwrap();
    for message in &messages {
        if let Err(e) = send_all(&mut guard.stream, message) {
            warn!(conn_id, error = %e, "Send failed");
            drop(guard);
            close_connection(connections, poller, callbacks, conn_id);
            return;
        }
    }

    guard.rearm();
    if let Err(e) = poller.reregister(&mut guard.stream, Token(conn_id), Interest::READABLE) {
        warn!(conn_id, error = %e, "Failed to post receive");
        drop(guard);
        close_connection(connections, poller, callbacks, conn_id);
    }
}

/// Release a connection exactly once and fire `on_disconnect`.
///
/// `remove` yields the connection only to the first caller; a second
/// completion racing on the same handle finds nothing to free.
fn close_connection(
    connections: &Arc<Mutex<ConnectionRegistry>>,
    poller: &Registry,
    callbacks: &Callbacks,
    conn_id: usize,
) {
    let removed = connections.lock().unwrap().remove(conn_id);
    let Some(conn) = removed else {
        return;
    };

    {
        let mut guard = conn.lock().unwrap();
        guard.disconnect();
        let _ = poller.deregister(&mut guard.stream);
    }

    if let Some(on_disconnect) = &callbacks.on_disconnect {
        on_disconnect();
    }

    debug!(conn_id, "Connection closed");
}

/// Write a whole message on a non-blocking stream, waiting for writability
/// when the kernel buffer is full.
fn send_all(stream: &mut mio::net::TcpStream, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match stream.write(data) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed during send",
                ))
            }
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => wait_writable(stream.as_raw_fd())?,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn wait_writable(fd: std::os::unix::io::RawFd) -> io::Result<()> {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };

    loop {
        let rc = unsafe { libc::poll(&mut pollfd, 1, -1) };
        if rc < 0 {
            let e = io::Error::last_os_error();
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(e);
        }
        return Ok(());
    }
}
