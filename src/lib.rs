use anyhow::Result;
use paperchef_agent::LazyAgent;
use paperchef_api::{start_server, AppState};
use paperchef_extract::extractor_from_config;
use paperchef_metrics::MetricsService;
use paperchef_models::Config;
use paperchef_storage::store_from_config;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use paperchef_api as api;
pub use paperchef_models as models;

/// Wires storage, extraction, the cooking agent and metrics from config.
pub async fn build_state(config: Config) -> Result<AppState> {
    let store = store_from_config(&config.storage)?;
    if let Err(e) = store.ensure_container(&config.storage.container).await {
        // Uploads report the storage error per request; the page and chat still work.
        warn!(
            container = %config.storage.container,
            error = %e,
            "Could not prepare blob container"
        );
    }

    let extractor = extractor_from_config(&config.extraction)?;
    let agent = Arc::new(LazyAgent::new(config.agent.clone()));
    if !agent.is_configured() {
        warn!("GITHUB_TOKEN is not set; chat endpoints will return 503");
    }
    let metrics = Arc::new(MetricsService::new()?);

    Ok(AppState::new(config, store, extractor, agent, metrics))
}

pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
}

/// Binds `server.bind:server.port` and serves until `shutdown` resolves.
pub async fn run(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let state = build_state(config).await?;
    let listener = TcpListener::bind(&addr).await?;
    start_server(state, listener, shutdown).await?;
    info!("paperchef stopped");
    Ok(())
}
