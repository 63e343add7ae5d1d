//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (ServiceConfig::default)
//!     → optional TOML file (loader.rs)
//!     → environment overrides: PORT, DATABASE_URL, REDIS_URL, LOG_FORMAT
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed by value / Arc to the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DependenciesConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig,
};
