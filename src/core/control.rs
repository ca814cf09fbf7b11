use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::watch;

use crate::core::relay::{RelayStats, StatsSnapshot};

/// Administrative routes, off the data path.
pub fn control_router(stats: Arc<RelayStats>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(stats)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(stats): State<Arc<RelayStats>>) -> Json<StatsSnapshot> {
    Json(stats.snapshot())
}

/// Serve the control endpoint until the shutdown signal flips.
pub async fn run_control_server(
    addr: SocketAddr,
    stats: Arc<RelayStats>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let app = control_router(stats);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Control endpoint listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Control endpoint shutting down");
        })
        .await
}
