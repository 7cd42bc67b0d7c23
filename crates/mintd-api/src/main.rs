//! mintd server binary
//!
//! Access-controlled resource layer over projects, issuer nodes, and assets.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! mintd --config config.yaml
//!
//! # With environment variables only
//! MINTD_SERVER__PORT=9090 mintd
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use mintd_api::http::{create_router_with_body_limit, AppState};
use mintd_api::observability::{init_logging, LoggingConfig};
use mintd_server::ServerConfig;
use mintd_storage::MemoryDataStore;

/// mintd - issuance resource layer
#[derive(Parser, Debug)]
#[command(name = "mintd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = args.config {
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    init_logging(&LoggingConfig {
        level: config.logging.level.clone(),
        json: config.logging.json,
    })
    .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting mintd server");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    match config.storage.backend.as_str() {
        "memory" => {
            info!("Using in-memory storage backend");
            let storage = Arc::new(MemoryDataStore::new());
            let state = AppState::new(storage);
            let router = create_router_with_body_limit(state, config.server.body_limit_bytes);
            run_http_server(router, addr).await
        }
        other => {
            error!("Unknown storage backend: {}", other);
            anyhow::bail!("Unknown storage backend: {other}");
        }
    }
}

/// Run the HTTP server with graceful shutdown.
async fn run_http_server(router: axum::Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!(%addr, "HTTP server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
