//! CarbonMax progress server entry point.
//!
//! Loads the quest catalog, opens the SQLite-backed progress store and
//! serves per-user quest progress over a small Axum REST API. Progress
//! writes are flushed by a background task that drains on shutdown.

mod api;
mod config;
mod db;
mod errors;
mod registry;
mod store;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use carbonmax_progress::QuestCatalog;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use registry::TrackerRegistry;
use store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let catalog = load_catalog(&config).await?;
    info!("Quest catalog ready with {} quests", catalog.len());

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // ─── Background progress writer ───────────────────────
    let writer_shutdown = CancellationToken::new();
    let (store, writer) = SqliteStore::open(pool, writer_shutdown.clone()).await?;

    // ─── REST API ─────────────────────────────────────────
    let api_state = Arc::new(api::ApiState {
        registry: TrackerRegistry::new(store, config.storage_key_prefix.clone()),
        catalog,
    });
    let app = api::router(api_state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = TcpListener::bind(&addr).await?;
    serve_until(listener, app, shutdown_signal(), writer_shutdown, writer).await?;
    info!("Shutdown complete");
    Ok(())
}

/// Serve until `signal` fires and in-flight requests finish, then stop the
/// progress writer and wait for it to flush.
///
/// The writer is only told to stop after the server returns, so progress
/// written by a request that was still running at shutdown is persisted.
async fn serve_until(
    listener: TcpListener,
    app: Router,
    signal: impl Future<Output = ()> + Send + 'static,
    writer_shutdown: CancellationToken,
    writer: JoinHandle<()>,
) -> anyhow::Result<()> {
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await;
    writer_shutdown.cancel();
    writer.await?;
    served?;
    Ok(())
}

async fn load_catalog(config: &Config) -> errors::Result<QuestCatalog> {
    match &config.quest_catalog_path {
        Some(path) => {
            info!("Loading quest catalog from {}", path.display());
            let json = tokio::fs::read_to_string(path).await?;
            Ok(QuestCatalog::from_json(&json)?)
        }
        None => Ok(QuestCatalog::builtin()?),
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested; finishing in-flight requests"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
