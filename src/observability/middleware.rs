//! Request observability middleware.
//!
//! # Responsibilities
//! - Start an observation before any handler runs
//! - Finalize it exactly once, whatever way the request ends
//! - Emit duration, count and in-flight metrics plus one access log record
//!
//! # Design Decisions
//! - `RequestObservation` is an RAII guard: `finish` on the normal path,
//!   `Drop` when the request future is abandoned (client gone, cancelled)
//! - Route label is the matched pattern when the router resolved one,
//!   the raw path otherwise (404s can therefore raise label cardinality)

use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderName, Method},
    middleware::Next,
    response::Response,
};

use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics::MetricsRegistry;

/// Status recorded for requests whose future was dropped before a response
/// existed (nginx's "client closed request").
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// One request's trip through the pipeline.
#[derive(Debug)]
pub struct RequestObservation {
    registry: MetricsRegistry,
    start: Instant,
    method: Method,
    route: String,
    path: String,
    user_agent: Option<String>,
    request_id: Option<String>,
    finished: bool,
}

impl RequestObservation {
    /// Open an observation for `request` and count it as in flight.
    pub fn begin<B>(registry: &MetricsRegistry, request: &axum::http::Request<B>) -> Self {
        let path = request.uri().path().to_string();
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string())
            .unwrap_or_else(|| path.clone());
        let header_str = |name: HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        registry.inc_in_flight();

        Self {
            registry: registry.clone(),
            start: Instant::now(),
            method: request.method().clone(),
            route,
            path,
            user_agent: header_str(header::USER_AGENT),
            request_id: header_str(X_REQUEST_ID),
            finished: false,
        }
    }

    /// Label used for the `route` metric dimension.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Close the observation with the response status.
    pub fn finish(mut self, status: u16) -> Duration {
        self.finalize(status)
    }

    fn finalize(&mut self, status: u16) -> Duration {
        let duration = self.start.elapsed();
        if self.finished {
            return duration;
        }
        self.finished = true;

        self.registry
            .record_request(self.method.as_str(), &self.route, status, duration);
        self.registry.dec_in_flight();

        let secs = duration.as_secs_f64();
        let user_agent = self.user_agent.as_deref().unwrap_or("");
        let request_id = self.request_id.as_deref().unwrap_or("");
        if status >= 500 {
            tracing::warn!(
                method = %self.method,
                path = %self.path,
                route = %self.route,
                status_code = status,
                duration = secs,
                user_agent,
                request_id,
                "HTTP request"
            );
        } else {
            tracing::info!(
                method = %self.method,
                path = %self.path,
                route = %self.route,
                status_code = status,
                duration = secs,
                user_agent,
                request_id,
                "HTTP request"
            );
        }

        duration
    }
}

impl Drop for RequestObservation {
    fn drop(&mut self) {
        if !self.finished {
            self.finalize(CLIENT_CLOSED_REQUEST);
        }
    }
}

/// Middleware wrapping every request in a [`RequestObservation`].
pub async fn track_requests(
    State(registry): State<MetricsRegistry>,
    request: Request,
    next: Next,
) -> Response {
    let observation = RequestObservation::begin(&registry, &request);
    let response = next.run(request).await;
    observation.finish(response.status().as_u16());
    response
}
