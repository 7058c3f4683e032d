//! Server facade composing the transport and the dispatcher.

use crate::error::ServerError;
use crate::http::{Request, Response};
use crate::runtime::{Callbacks, Transport};
use std::sync::Arc;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Worker threads draining the completion queue.
    pub workers: usize,
    /// Receive buffer capacity per connection, in bytes.
    pub buffer_size: usize,
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            workers: 8,
            buffer_size: 4096,
            max_connections: 1024,
        }
    }
}

/// HTTP server.
///
/// Register callbacks, then call `listen` to serve. There is no idle
/// timeout: a connection that never sends occupies a slot until the
/// process exits.
pub struct Server {
    config: ServerConfig,
    callbacks: Callbacks,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            callbacks: Callbacks::default(),
        }
    }

    /// Register the request handler. Exactly one handler is active;
    /// registering again replaces the previous one.
    ///
    /// The handler runs concurrently on worker threads, so it must be a
    /// pure function of the request or synchronize internally. Each
    /// returned response is sent on the connection in order.
    pub fn on_receive<F>(&mut self, handler: F)
    where
        F: Fn(Request) -> Vec<Response> + Send + Sync + 'static,
    {
        self.callbacks.on_receive = Some(Arc::new(handler));
    }

    /// Register a callback fired after each accepted connection is set up.
    /// Invoked from the accept loop; same concurrency contract as
    /// `on_receive`.
    pub fn on_connect<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.on_connect = Some(Arc::new(callback));
    }

    /// Register a callback fired exactly once per connection teardown.
    pub fn on_disconnect<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.on_disconnect = Some(Arc::new(callback));
    }

    /// Configured host, for building `Location` and absolute-URL headers.
    pub fn get_host(&self) -> &str {
        &self.config.host
    }

    /// Initialize the transport and serve until process exit.
    ///
    /// Blocks on the accept loop. Returns only on a startup failure;
    /// per-connection failures are contained and logged.
    pub fn listen(&self) -> Result<(), ServerError> {
        let transport = Transport::bind(&self.config, self.callbacks.clone())?;
        transport.accept_loop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ContentType, StatusCode};

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3000);
        assert_eq!(config.workers, 8);
        assert_eq!(config.buffer_size, 4096);
    }

    #[test]
    fn test_get_host() {
        let server = Server::new(ServerConfig {
            host: "example.com".to_string(),
            ..ServerConfig::default()
        });
        assert_eq!(server.get_host(), "example.com");
    }

    #[test]
    fn test_handler_registration_replaces() {
        let mut server = Server::new(ServerConfig::default());

        server.on_receive(|_| vec![Response::create(StatusCode::Ok, ContentType::Text, "a")]);
        server.on_receive(|_| vec![Response::create(StatusCode::Ok, ContentType::Text, "b")]);

        let handler = server.callbacks.on_receive.clone().unwrap();
        let request = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        let responses = handler(request);
        assert_eq!(responses[0].body, "b");
    }
}
