//! ski-core — realtime core for a social ski-tracking service.
//!
//! Live location fan-out and a chat fabric over one shared WebSocket
//! transport, horizontally scaled behind sticky routing.

use ski_core::config::Config;
use ski_core::state::Core;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Resolve the configuration path from CLI arguments.
/// Supports `-c <path>`, `--config <path>`, or a bare path.
/// Falls back to `config.toml` when no argument is provided.
fn resolve_config_path() -> String {
    let mut args = std::env::args().skip(1);

    match args.next() {
        Some(flag) if flag == "-c" || flag == "--config" => args.next().unwrap_or_else(|| {
            eprintln!("Missing path after {flag}");
            std::process::exit(1);
        }),
        Some(path) => path,
        None => "config.toml".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = resolve_config_path();

    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("ERROR: Failed to load config from {config_path}: {e}");
        e
    })?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match config.server.log_format {
        ski_core::config::LogFormat::Json => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).json().init();
        }
        ski_core::config::LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).init();
        }
    }

    if let Err(errors) = ski_core::config::validate(&config) {
        for err in &errors {
            error!(error = %err, "Configuration validation failed");
        }
        return Err(anyhow::anyhow!("Configuration validation failed with {} error(s)", errors.len()));
    }

    info!(server = %config.server.name, "Starting ski-core");

    let metrics_port = config.server.metrics_port;
    let ws_addr = config.server.ws_addr.clone();

    ski_core::metrics::init();
    tokio::spawn(async move {
        ski_core::http::run_http_server(metrics_port).await;
    });
    info!(port = metrics_port, "Prometheus HTTP server started");

    let core = Arc::new(Core::new(config).await?);
    info!("Core initialized: HOT, WARM, Backplane, ConnectionRegistry, JobQueue, LocationEngine, ChatEngine");

    let app = ski_core::gateway::router(core.clone());
    let listener = tokio::net::TcpListener::bind(&ws_addr).await?;
    info!(addr = %ws_addr, "Gateway listening");

    // SIGINT/SIGTERM trigger a graceful shutdown: stop accepting new
    // connections and flush any pings still buffered in the persister.
    let shutdown_core = core.clone();
    let shutdown_signal = async move {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
        shutdown_core.location.flush_pending_pings().await;
    };

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await?;

    info!("Gateway stopped");
    Ok(())
}
