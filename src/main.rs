use std::sync::Arc;

use scrap_pickup::config::{Config, LogFormat};
use scrap_pickup::error::AppError;
use scrap_pickup::state::AppState;
use scrap_pickup::store::FileStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }

    let store = Arc::new(FileStore::new(config.store_path.clone()));
    tracing::info!(store_path = %config.store_path.display(), "opening store");

    let state = AppState::bootstrap(store, config.event_buffer_size).await;

    let screens = state.session.screens();
    tracing::info!(entry = ?screens.entry(), "routing resolved");

    let snapshot = state.ledger.snapshot();
    tracing::info!(
        pickups = snapshot.len(),
        available = state.ledger.get_available().len(),
        "ledger summary"
    );

    shutdown_signal().await;

    match state.metrics.encode() {
        Ok(body) => tracing::debug!(metrics = %body, "final metrics"),
        Err(err) => return Err(AppError::Internal(err)),
    }
    tracing::info!("shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
