//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → middleware.rs (RequestObservation: start → finish/drop)
//!         → metrics.rs (histogram, counter, in-flight gauge)
//!         → tracing event "HTTP request" (logging.rs subscriber)
//!
//! Background:
//!     → runtime.rs (scheduler lag gauge)
//!
//! Consumers:
//!     → GET /metrics (Prometheus scrape)
//!     → stdout log stream (JSON or pretty)
//! ```
//!
//! # Design Decisions
//! - Registry is constructed once in the server and injected, never global
//! - Metrics are cheap (atomic increments)
//! - One access log record per request, emitted at completion

pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod runtime;

pub use metrics::MetricsRegistry;
pub use middleware::{track_requests, RequestObservation};
