//! Liveness and readiness endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health`: the process is alive. Never looks at dependencies.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.metrics.uptime().as_secs_f64(),
    })
}

/// `GET /ready`: every configured dependency answered in time.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    match state.dependencies.check_all().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessReport {
                status: "ready",
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessReport {
                    status: "not ready",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
