//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the process's metric storage (no global recorder is installed)
//! - Record per-request series and the in-flight gauge
//! - Render the Prometheus text exposition format on demand
//!
//! # Metrics
//! - `http_request_duration_seconds` (histogram): latency by method, route, status
//! - `http_requests_total` (counter): requests by method, route, status
//! - `active_connections` (gauge): requests currently in flight
//! - `runtime_scheduler_lag_seconds` (gauge): timer overshoot on the runtime
//! - `process_uptime_seconds` (gauge) plus the `process_*` defaults
//!
//! # Design Decisions
//! - The registry is a cheap `Clone` handle; every clone writes the same storage
//! - Updates are atomic inside the exporter, so concurrent requests need no lock
//! - Histogram buckets tuned for typical web latencies

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::Unit;
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const ACTIVE_CONNECTIONS: &str = "active_connections";
pub const SCHEDULER_LAG: &str = "runtime_scheduler_lag_seconds";
pub const PROCESS_UPTIME: &str = "process_uptime_seconds";

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Explicitly constructed metrics registry.
///
/// Components receive a clone of this handle instead of reaching for a
/// process-wide recorder, which also keeps tests isolated from each other.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    process: metrics_process::Collector,
    started_at: Instant,
}

impl MetricsRegistry {
    /// Create a registry with all series described and the in-flight gauge at zero.
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        let registry = Self {
            inner: Arc::new(Inner {
                recorder,
                handle,
                process: metrics_process::Collector::default(),
                started_at: Instant::now(),
            }),
        };
        registry.describe();
        Ok(registry)
    }

    /// Run `f` with this registry as the active recorder.
    fn scoped<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.inner.recorder, f)
    }

    fn describe(&self) {
        self.scoped(|| {
            metrics::describe_histogram!(
                REQUEST_DURATION,
                Unit::Seconds,
                "Duration of HTTP requests in seconds"
            );
            metrics::describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests");
            metrics::describe_gauge!(ACTIVE_CONNECTIONS, "Number of active connections");
            metrics::describe_gauge!(
                SCHEDULER_LAG,
                Unit::Seconds,
                "Delay between a timer's deadline and the task being polled"
            );
            metrics::describe_gauge!(
                PROCESS_UPTIME,
                Unit::Seconds,
                "Seconds since the process started serving"
            );
            metrics::gauge!(ACTIVE_CONNECTIONS).set(0.0);
            self.inner.process.describe();
        });
    }

    /// Time since the registry (and with it the service) was created.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// A request entered the pipeline.
    pub fn inc_in_flight(&self) {
        self.scoped(|| metrics::gauge!(ACTIVE_CONNECTIONS).increment(1.0));
    }

    /// A request left the pipeline.
    pub fn dec_in_flight(&self) {
        self.scoped(|| metrics::gauge!(ACTIVE_CONNECTIONS).decrement(1.0));
    }

    /// Record one completed request.
    pub fn record_request(&self, method: &str, route: &str, status: u16, duration: Duration) {
        let labels = [
            ("method", method.to_owned()),
            ("route", route.to_owned()),
            ("status_code", status.to_string()),
        ];
        self.scoped(|| {
            metrics::histogram!(REQUEST_DURATION, &labels).record(duration.as_secs_f64());
            metrics::counter!(REQUESTS_TOTAL, &labels).increment(1);
        });
    }

    pub fn record_scheduler_lag(&self, lag: Duration) {
        self.scoped(|| metrics::gauge!(SCHEDULER_LAG).set(lag.as_secs_f64()));
    }

    /// Collect process metrics and render a full snapshot.
    pub fn render(&self) -> String {
        self.scoped(|| {
            self.inner.process.collect();
            metrics::gauge!(PROCESS_UPTIME).set(self.uptime().as_secs_f64());
        });
        self.inner.handle.render()
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("uptime", &self.uptime())
            .finish_non_exhaustive()
    }
}

/// Find the value of a sample in a Prometheus text exposition.
///
/// `labels` is a subset match: the sample may carry more labels than given.
pub fn sample_value(exposition: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (series_name, label_block) = match series.split_once('{') {
                Some((n, rest)) => (n, rest.strip_suffix('}')?),
                None => (series, ""),
            };
            if series_name != name {
                return None;
            }
            let all_present = labels
                .iter()
                .all(|(k, v)| has_label(label_block, k, v));
            if !all_present {
                return None;
            }
            value.parse().ok()
        })
}

fn has_label(block: &str, key: &str, value: &str) -> bool {
    let needle = format!("{}=\"{}\"", key, value);
    block.match_indices(&needle).any(|(idx, _)| {
        let boundary_before = idx == 0 || block[..idx].ends_with(',');
        let end = idx + needle.len();
        let boundary_after = end == block.len() || block[end..].starts_with(',');
        boundary_before && boundary_after
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_zero_in_flight() {
        let registry = MetricsRegistry::new().unwrap();
        let out = registry.render();
        assert_eq!(sample_value(&out, ACTIVE_CONNECTIONS, &[]), Some(0.0));
    }

    #[test]
    fn in_flight_rises_and_falls() {
        let registry = MetricsRegistry::new().unwrap();
        registry.inc_in_flight();
        registry.inc_in_flight();
        assert_eq!(sample_value(&registry.render(), ACTIVE_CONNECTIONS, &[]), Some(2.0));

        registry.dec_in_flight();
        registry.dec_in_flight();
        assert_eq!(sample_value(&registry.render(), ACTIVE_CONNECTIONS, &[]), Some(0.0));
    }

    #[test]
    fn request_records_counter_and_histogram() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_request("GET", "/users/{id}", 200, Duration::from_millis(20));
        registry.record_request("GET", "/users/{id}", 200, Duration::from_millis(40));
        registry.record_request("GET", "/users/{id}", 404, Duration::from_millis(1));

        let out = registry.render();
        let ok = [("method", "GET"), ("route", "/users/{id}"), ("status_code", "200")];
        assert_eq!(sample_value(&out, REQUESTS_TOTAL, &ok), Some(2.0));
        assert_eq!(
            sample_value(&out, "http_request_duration_seconds_count", &ok),
            Some(2.0)
        );
        assert_eq!(
            sample_value(
                &out,
                REQUESTS_TOTAL,
                &[("route", "/users/{id}"), ("status_code", "404")]
            ),
            Some(1.0)
        );
        assert!(out.contains("http_request_duration_seconds_bucket"));
    }

    #[test]
    fn registries_are_isolated() {
        let a = MetricsRegistry::new().unwrap();
        let b = MetricsRegistry::new().unwrap();
        a.record_request("POST", "/x", 201, Duration::from_millis(1));
        assert!(sample_value(&b.render(), REQUESTS_TOTAL, &[]).is_none());
    }

    #[test]
    fn render_includes_uptime_and_help() {
        let registry = MetricsRegistry::new().unwrap();
        let out = registry.render();
        assert!(sample_value(&out, PROCESS_UPTIME, &[]).unwrap() >= 0.0);
        assert!(out.contains("# HELP active_connections"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn render_includes_process_defaults() {
        let registry = MetricsRegistry::new().unwrap();
        assert!(registry.render().contains("process_resident_memory_bytes"));
    }

    #[test]
    fn sample_value_matches_whole_labels() {
        let text = "# TYPE x counter\nx{route=\"/a/b\",method=\"GET\"} 3\nx{route=\"/a\",method=\"GET\"} 7\n";
        assert_eq!(sample_value(text, "x", &[("route", "/a")]), Some(7.0));
        assert_eq!(sample_value(text, "x", &[("route", "/a/b")]), Some(3.0));
        assert_eq!(sample_value(text, "x", &[("route", "/c")]), None);
        assert_eq!(sample_value(text, "y", &[]), None);
    }
}
