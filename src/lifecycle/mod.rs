//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Running → Draining → Terminated
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Draining (stop accept, finish in-flight)
//!     second SIGTERM/SIGINT → Terminated
//!
//! Server (http/server.rs):
//!     Draining + all connections closed → Terminated
//!     Draining + drain timeout elapsed  → Terminated (forced)
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced exit after deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::{Phase, Shutdown};
