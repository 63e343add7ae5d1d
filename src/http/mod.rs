//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve)
//!     → request.rs (assign / propagate x-request-id)
//!     → TraceLayer span
//!     → observability::middleware (observation start)
//!     → error.rs panic catcher, timeout, body limit
//!     → routes (handlers)
//!     → observability::middleware (observation finish)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod server;

pub use error::AppError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
