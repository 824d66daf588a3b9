use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::{BackendKind, Config, KeyedDriver, RangedDriver, StorageConfig},
    handlers::{self, logs::AppState},
    metrics,
    pipeline::IngestPipeline,
    signals::shutdown_signal,
    store::{Backend, FileStore, MemoryKeyedStore, MemoryLogList, SqliteLogList},
    transform::build_transform,
};

/// Start the gateway
///
/// This function:
/// 1. Initializes metrics
/// 2. Opens the configured store
/// 3. Spawns the ingest pipeline
/// 4. Serves requests until SIGINT/SIGTERM
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics()?);

    let backend = build_backend(&config.storage).await?;
    let pipeline = build_pipeline(&config, backend.clone());

    let app = create_router(AppState { backend, pipeline }, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting perflog gateway on {}", addr);
    info!(
        "Configuration: backend={:?}, workers={}, transform={:?}",
        config.storage.backend, config.pipeline.workers, config.pipeline.transform
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Open the store named by the config. Called once; the handle lives as long
/// as the process.
pub async fn build_backend(storage: &StorageConfig) -> Result<Backend> {
    let backend = match storage.backend {
        BackendKind::Keyed => match storage.keyed_driver {
            KeyedDriver::File => {
                let store = FileStore::open(&storage.directory)
                    .await
                    .with_context(|| format!("Failed to open {}", storage.directory.display()))?;
                Backend::Keyed(Arc::new(store))
            }
            KeyedDriver::Memory => Backend::Keyed(Arc::new(MemoryKeyedStore::new())),
        },
        BackendKind::Ranged => match storage.ranged_driver {
            RangedDriver::Sqlite => {
                let list = SqliteLogList::connect(&storage.database_url, storage.max_connections)
                    .await
                    .context("Failed to open log database")?;
                Backend::Ranged(Arc::new(list))
            }
            RangedDriver::Memory => Backend::Ranged(Arc::new(MemoryLogList::new())),
        },
    };

    Ok(backend)
}

pub fn build_pipeline(config: &Config, backend: Backend) -> IngestPipeline {
    let transform = build_transform(
        config.pipeline.transform,
        Duration::from_millis(config.pipeline.transform_delay_ms),
    );
    IngestPipeline::spawn(Arc::new(backend), transform, config.pipeline.workers)
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, metrics_handle: Arc<PrometheusHandle>) -> Router {
    let log_routes = Router::new()
        .route(
            "/",
            get(handlers::logs::read_logs).post(handlers::logs::create_log),
        )
        .route("/logs/:log_id", get(handlers::logs::read_log))
        .route("/health", get(handlers::health::health_check))
        .with_state(state);

    Router::new()
        .route("/metrics", get(handlers::health::metrics))
        .with_state(metrics_handle)
        .merge(log_routes)
        // Log lines are short; 1MB is plenty
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
}
