//! HTTP surface: Prometheus `/metrics` and the liveness `/health` endpoint.
//!
//! Per spec §6 the richer HTTP surface (resort CRUD, GeoJSON export, map
//! tiles) is an external collaborator; this module only carries the thin
//! ambient operational endpoints.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Instant;

static START: OnceLock<Instant> = OnceLock::new();

#[derive(Serialize)]
struct Health {
    status: &'static str,
    uptime: u64,
    version: &'static str,
}

async fn health_handler() -> Json<Health> {
    let uptime = START.get().map(|s| s.elapsed().as_secs()).unwrap_or(0);
    Json(Health { status: "ok", uptime, version: env!("CARGO_PKG_VERSION") })
}

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Run the HTTP server for `/health` and `/metrics`. Long-running; spawn
/// in the background.
pub async fn run_http_server(port: u16) {
    START.get_or_init(Instant::now);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "HTTP server listening");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind HTTP server");
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "HTTP server error");
    }
}
