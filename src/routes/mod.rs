//! Route table.
//!
//! # Routes
//! - `GET /`            landing payload
//! - `GET /health`      liveness, no dependency checks
//! - `GET /ready`       readiness over configured dependencies
//! - `GET /metrics`     Prometheus exposition
//! - `GET /db-test`     database reachability
//! - `GET /api/users`   placeholder list
//! - `POST /api/users`  placeholder create
//!
//! Anything else falls through to a JSON 404.

pub mod metrics;
pub mod probes;
pub mod scaffold;
pub mod users;

use axum::{routing::get, Router};

use crate::http::{error::AppError, server::AppState};

/// All service routes, without state or middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scaffold::index))
        .route("/health", get(probes::health))
        .route("/ready", get(probes::ready))
        .route("/metrics", get(metrics::export))
        .route("/db-test", get(scaffold::db_test))
        .route("/api/users", get(users::list).post(users::create))
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound
}
