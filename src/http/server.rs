//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared application state (metrics registry, dependencies)
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, observation, panics, limits)
//! - Serve with graceful, time-bounded shutdown

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::FromRef, middleware, Router};
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::health::{CheckError, Dependencies};
use crate::http::error::panic_response;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics::MetricsRegistry;
use crate::observability::middleware::track_requests;
use crate::observability::runtime::sample_scheduler_lag;
use crate::routes;

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build metrics registry: {0}")]
    Metrics(#[from] BuildError),

    #[error("invalid dependency configuration: {0}")]
    Dependency(#[from] CheckError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub metrics: MetricsRegistry,
    pub dependencies: Arc<Dependencies>,
}

impl AppState {
    pub fn new(metrics: MetricsRegistry, dependencies: Dependencies) -> Self {
        Self {
            metrics,
            dependencies: Arc::new(dependencies),
        }
    }

    /// Fresh registry plus probes for the configured dependencies.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServerError> {
        let metrics = MetricsRegistry::new()?;
        let dependencies = Dependencies::from_config(&config.dependencies, &config.readiness)?;
        Ok(Self::new(metrics, dependencies))
    }
}

impl FromRef<AppState> for MetricsRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server with the standard routes.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        Ok(Self::with_routes(config, state, routes::router()))
    }

    /// Create a server over an explicit route table and state.
    pub fn with_routes(config: ServiceConfig, state: AppState, routes: Router<AppState>) -> Self {
        let router = Self::build_router(&config, state.clone(), routes);
        Self {
            router,
            config,
            state,
        }
    }

    /// Attach state and the middleware stack. Outermost layer last.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState, routes: Router<AppState>) -> Router {
        let metrics = state.metrics.clone();
        routes
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(metrics, track_requests))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the server until `shutdown` completes.
    ///
    /// Marks `shutdown` as terminated before returning.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let probe = tokio::spawn(sample_scheduler_lag(
            self.state.metrics.clone(),
            Duration::from_millis(self.config.observability.scheduler_lag_interval_ms),
            shutdown.subscribe(),
        ));

        let drain_timeout = Duration::from_secs(self.config.shutdown.drain_timeout_secs);
        let result = serve(listener, self.router, shutdown.clone(), drain_timeout).await;

        probe.abort();
        shutdown.terminate();
        tracing::info!("HTTP server stopped");
        result
    }
}

/// Serve `router` until the connections drain or `drain_timeout` passes
/// after shutdown began. An early `terminate` also cuts the drain short.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: Shutdown,
    drain_timeout: Duration,
) -> Result<(), ServerError> {
    let stop_accepting = {
        let shutdown = shutdown.clone();
        async move { shutdown.draining().await }
    };
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(stop_accepting)
        .into_future();

    let forced = async {
        shutdown.draining().await;
        tracing::info!(
            drain_timeout_secs = drain_timeout.as_secs(),
            "Draining in-flight requests"
        );
        tokio::select! {
            _ = tokio::time::sleep(drain_timeout) => {
                tracing::warn!("Drain timeout elapsed, terminating with requests in flight");
            }
            _ = shutdown.terminated() => {
                tracing::warn!("Drain cut short");
            }
        }
    };

    tokio::select! {
        result = server => result?,
        _ = forced => {}
    }
    Ok(())
}
