//! Dependency health subsystem.
//!
//! # Data Flow
//! ```text
//! DATABASE_URL / REDIS_URL (config)
//!     → checks.rs (TcpProbe per configured service)
//!     → readiness.rs (Dependencies: time-bounded, first failure wins)
//!     → GET /ready, GET /db-test
//! ```
//!
//! # Design Decisions
//! - Liveness (`/health`) never consults dependencies
//! - Check failures are values, converted to 503 by the handlers

pub mod checks;
pub mod readiness;

pub use checks::{CheckError, DependencyCheck, TcpProbe};
pub use readiness::Dependencies;
