//! Application setup and initialization

pub mod background;
pub mod database;
pub mod routes;
pub mod server;

use crate::state::{AppState, Backends};
use anyhow::{Context, Result};
use quill_core::Config;
use quill_infra::{init_telemetry, LogFormat};
use quill_services::StreamApiClient;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    init_telemetry(LogFormat::from_env()).context("Failed to initialize telemetry")?;
    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;

    let storage = quill_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!(backend = ?storage.backend_type(), "Storage initialized");

    let transcoder = StreamApiClient::new(config.transcoder())
        .context("Failed to initialize transcoding client")?;

    let state = Arc::new(AppState::new(
        config.clone(),
        Backends::postgres(pool, storage, Arc::new(transcoder)),
    ));

    background::spawn_session_sweep(
        state.auth.sessions.clone(),
        config.session_sweep_interval_secs(),
    );
    background::spawn_reconcile_sweep(
        state.media.reconciler.clone(),
        config.reconcile_sweep_interval_secs(),
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
