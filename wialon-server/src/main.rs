//! wialon-server — WialonIPS telematics server.
//!
//! Accepts device connections, validates logins against a file-backed
//! device registry, and dispatches short/extended/blackbox data frames to
//! their acknowledgements.

use wialon_server::config::ServerConfig;
use wialon_server::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log.clone().into()),
        )
        .init();

    server::run(config).await
}
