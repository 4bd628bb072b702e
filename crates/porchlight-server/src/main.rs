//! Sync server entry point for the Porchlight counter.
//!
//! Initializes logging, loads configuration from environment variables,
//! builds the authoritative counter store, and serves the HTTP + SSE API
//! until the process receives ctrl-c. A restart resets the counter; the
//! state is deliberately in-memory only.

use std::sync::Arc;

use porchlight_core::StateStore;
use porchlight_server::config::PorchlightConfig;
use porchlight_server::server::{start_server, ServerConfig};
use porchlight_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot
/// bind its address.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("porchlight-server starting");

    let config = PorchlightConfig::from_env()?;
    info!(
        host = config.host,
        port = config.port,
        initial_candy = config.initial_candy_count,
        candy_per_child = config.candy_per_child,
        "configuration loaded"
    );

    let store = StateStore::new(config.initial_candy_count, config.candy_per_child);
    let snapshot = store.snapshot();
    info!(
        count = snapshot.current_count,
        candy = snapshot.candy_remaining,
        of = snapshot.initial_candy_count,
        "initial counter state"
    );

    let state = Arc::new(AppState::new(store));

    let server_config = ServerConfig {
        host: config.host,
        port: config.port,
    };
    start_server(&server_config, state).await?;

    Ok(())
}
