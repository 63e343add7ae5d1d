//! Starter-project endpoints: a landing route and a database reachability test.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::health::readiness::millis;
use crate::http::{error::AppError, server::AppState};

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DbTestReport {
    pub status: &'static str,
    pub dependency: String,
    pub latency_ms: u64,
}

pub async fn index() -> Json<Welcome> {
    Json(Welcome {
        message: "service-skeleton is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /db-test`: probe the database named by `DATABASE_URL`.
pub async fn db_test(State(state): State<AppState>) -> Result<Json<DbTestReport>, AppError> {
    let database = state
        .dependencies
        .database()
        .ok_or_else(|| AppError::ServiceUnavailable("database not configured".into()))?;

    let latency = state.dependencies.probe(database).await.map_err(|e| {
        tracing::warn!(error = %e, "Database test failed");
        AppError::ServiceUnavailable(e.to_string())
    })?;

    Ok(Json(DbTestReport {
        status: "connected",
        dependency: database.name().to_string(),
        latency_ms: millis(latency),
    }))
}
