//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, port non-zero)
//! - Check dependency URLs carry a host and a port
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;
use crate::health::checks::connection_port;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("{field} has no host or port")]
    IncompleteUrl { field: &'static str },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::Zero { field: "listener.port" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_size" });
    }
    if config.readiness.check_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "readiness.check_timeout_ms" });
    }
    if config.observability.scheduler_lag_interval_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "observability.scheduler_lag_interval_ms",
        });
    }

    let urls = [
        ("dependencies.database_url", &config.dependencies.database_url),
        ("dependencies.redis_url", &config.dependencies.redis_url),
    ];
    for (field, value) in urls {
        if let Some(raw) = value {
            if let Err(e) = check_url(field, raw) {
                errors.push(e);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() || connection_port(&url).is_none() {
        return Err(ValidationError::IncompleteUrl { field });
    }
    Ok(())
}
