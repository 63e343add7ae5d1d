//! Service skeleton (v1)
//!
//! A minimal HTTP service built with Tokio and Axum, instrumented the way a
//! production service should be from day one.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace span ─▶ observation start ─▶ handler
//!                                                                        │
//!     Client Response                                                    ▼
//!     ◀────────────── request id ◀─ trace span ◀─ observation finish ◀─ response
//!                                                  │
//!                                                  ├─▶ metrics registry ─▶ GET /metrics
//!                                                  └─▶ access log (stdout)
//!
//!     SIGTERM/SIGINT ─▶ Shutdown: Running → Draining → Terminated
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_skeleton::config::load_config;
use service_skeleton::http::HttpServer;
use service_skeleton::lifecycle::{signals, Shutdown};
use service_skeleton::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "service-skeleton")]
#[command(about = "Minimal HTTP service with metrics, health checks and graceful shutdown", long_about = None)]
struct Args {
    /// Optional TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-skeleton starting");
    tracing::info!(
        bind_address = %config.bind_address(),
        request_timeout_secs = config.timeouts.request_secs,
        drain_timeout_secs = config.shutdown.drain_timeout_secs,
        database = config.dependencies.database_url.is_some(),
        cache = config.dependencies.redis_url.is_some(),
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(server.config().bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Server running");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown).await?;

    tracing::info!("Process terminated");
    Ok(())
}
