use axum::{extract::State, http::header, response::IntoResponse};

use crate::observability::metrics::{MetricsRegistry, CONTENT_TYPE};

/// `GET /metrics`: a fresh, unfiltered snapshot of the registry.
pub async fn export(State(metrics): State<MetricsRegistry>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], metrics.render())
}
