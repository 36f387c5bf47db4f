//! TCP accept loop: one session task per connection, sharing the device
//! registry and the set of currently logged-in IMEIs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::registry::DeviceRegistry;
use crate::session::handle_connection;

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let registry = Arc::new(Mutex::new(DeviceRegistry::load(&config.devices_path)));
    let active: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, devices = registry.lock().unwrap().len(), "wialon-server listening");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let registry = registry.clone();
                let active = active.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer, registry, active).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "accept error");
            }
        }
    }
}
