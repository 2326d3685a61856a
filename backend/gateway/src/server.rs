//! HTTP router and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use grid_store::ChunkStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::cors::{origin_guard, CorsPolicy};
use crate::download::download_file;
use crate::upload::upload_file;

/// Default request body cap for uploads (64 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub const ROOT_BANNER: &str = "file upload API";

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn ChunkStore>,
}

impl GatewayState {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }
}

/// HTTP-facing settings that are not part of handler state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub cors: CorsPolicy,
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cors: CorsPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Build the gateway router with its CORS and tracing layers.
pub fn build_router(state: GatewayState, config: &GatewayConfig) -> Router {
    let policy = Arc::new(config.cors.clone());

    Router::new()
        .route("/", get(|| async { ROOT_BANNER }))
        .route("/upload", post(upload_file))
        .route("/file/:filename", get(download_file))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
        .layer(policy.layer())
        .layer(middleware::from_fn_with_state(policy, origin_guard))
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl-C.
#[instrument(skip(app))]
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on port {}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
