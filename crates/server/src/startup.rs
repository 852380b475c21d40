use std::path::Path;

use axum::http::{header, Method};
use configs::{AppConfig, ServerConfig, StorageBackend};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;
use service::{catalog::CatalogService, runtime, storage};

/// Any origin, the five methods the front end uses, JSON bodies.
pub fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
}

/// Open the configured store and wrap it in the catalog service.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let store = storage::open_store(&cfg.storage).await?;
    Ok(AppState::new(CatalogService::new(store)))
}

async fn bind(server: &ServerConfig) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
    Ok(listener)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(err = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Validate `cfg`, build the app and serve until Ctrl+C.
pub async fn run_with_config(mut cfg: AppConfig) -> anyhow::Result<()> {
    cfg.normalize_and_validate()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let static_dir = cfg.server.static_dir.as_deref();
    let data_file = match cfg.storage.backend {
        StorageBackend::File => cfg.storage.data_file.as_path(),
        StorageBackend::Kv => Path::new(""),
    };
    runtime::ensure_env(static_dir, data_file).await?;

    let state = build_state(&cfg).await?;
    let app = routes::build_router(state, build_cors(), static_dir);

    let listener = bind(&cfg.server).await?;
    let addr = listener.local_addr()?;
    info!(%addr, backend = ?cfg.storage.backend, "starting catalog server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("catalog server stopped");
    Ok(())
}
