//! hearth: a minimal HTTP/1.1 server on a completion-queue worker pool.

use hearth::config::Config;
use hearth::{ContentType, Response, Server, StatusCode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        workers = config.workers,
        "Starting hearth"
    );

    let mut server = Server::new(config.server_config());

    server.on_receive(|request| {
        info!(method = %request.method, target = %request.target, "Request");
        vec![Response::create(
            StatusCode::Ok,
            ContentType::Text,
            "Hello World!",
        )]
    });

    if let Err(e) = server.listen() {
        error!(error = %e, "Startup failed");
        std::process::exit(1);
    }
}
