//! microircd - a small relay chat daemon.
//!
//! Lines are parsed into messages, dispatched through a connection-context
//! scoped command registry, and processed on a single core task that owns
//! all server state.

mod config;
mod error;
mod handlers;
mod modes;
mod network;
mod state;

use crate::config::Config;
use crate::handlers::Registry;
use crate::network::{Dispatcher, Gateway};
use crate::state::{ConnContext, ServerInfo, ServerState};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.name,
        network = %config.server.network,
        description = %config.server.description,
        "Starting microircd"
    );

    let registry = Registry::new()?;
    debug!(
        unregistered = ?registry.verbs(ConnContext::Unregistered).collect::<Vec<_>>(),
        user = ?registry.verbs(ConnContext::User).collect::<Vec<_>>(),
        "Command registry ready"
    );
    let state = ServerState::new(ServerInfo::from_config(&config));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let dispatcher = tokio::spawn(Dispatcher::new(state, registry).run(events_rx));

    let gateway = Gateway::bind(config.listen.address, config.limits.line_len).await?;

    tokio::select! {
        result = gateway.run(events_tx) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    dispatcher.abort();
    Ok(())
}
