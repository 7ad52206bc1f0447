//! pull-ledger server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pull_ledger::api;
use pull_ledger::app_state::AppState;
use pull_ledger::cache::MetadataLookup;
use pull_ledger::config::LedgerConfig;
use pull_ledger::domain::{EventBus, SyncMode};
use pull_ledger::persistence::{LedgerStore, SqliteStore};
use pull_ledger::remote::{HttpRemoteSource, RemoteSource};
use pull_ledger::service::LedgerService;
use pull_ledger::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = LedgerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("invalid configuration")?;
    tracing::info!(addr = %config.listen_addr, "starting pull-ledger");

    // Build collaborators
    let store = SqliteStore::connect(&config.database_url, config.database_max_connections)
        .await
        .context("opening ledger database")?;
    let store: Arc<dyn LedgerStore> = Arc::new(store);
    let remote: Arc<dyn RemoteSource> =
        Arc::new(HttpRemoteSource::from_config(&config).context("building http client")?);
    let metadata = Arc::new(MetadataLookup::from_config(&config));
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let ledger = Arc::new(LedgerService::new(
        store, remote, metadata, event_bus, &config,
    ));
    ledger.init().await.context("loading ledger")?;
    if config.auto_sync_on_start {
        let _ = ledger.spawn_background_sync(SyncMode::Incremental);
    }

    // Build application state
    let app_state = AppState::new(ledger);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
