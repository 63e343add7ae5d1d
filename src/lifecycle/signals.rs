//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGTERM and SIGINT
//! - Translate the first one into a graceful drain
//! - Translate a second one into an immediate termination
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - If the SIGTERM handler cannot be installed, ctrl-c still works

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Wait for the next termination signal and return its name.
#[cfg(unix)]
pub async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                name = ctrl_c() => name,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            ctrl_c().await
        }
    }
}

/// Wait for the next termination signal and return its name.
#[cfg(not(unix))]
pub async fn termination_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        // Without a handler the process can only be killed; park forever.
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

/// Spawn the task driving `shutdown` from OS signals.
pub fn spawn_signal_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal = termination_signal().await;
        tracing::info!(signal, "Shutdown signal received, draining connections");
        shutdown.trigger();

        tokio::select! {
            signal = termination_signal() => {
                tracing::warn!(signal, "Second shutdown signal, terminating immediately");
                shutdown.terminate();
            }
            _ = shutdown.terminated() => {}
        }
    })
}
