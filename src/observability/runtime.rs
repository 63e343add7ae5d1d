//! Runtime scheduler lag probe.
//!
//! Sleeps for a fixed period and records how late the task was woken.
//! A busy or blocked runtime shows up as a growing lag.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};

use crate::lifecycle::shutdown::Phase;
use crate::observability::metrics::MetricsRegistry;

/// Sample scheduler lag every `period` until shutdown leaves `Running`.
pub async fn sample_scheduler_lag(
    registry: MetricsRegistry,
    period: Duration,
    mut phase: watch::Receiver<Phase>,
) {
    tracing::debug!(
        period_ms = crate::health::readiness::millis(period),
        "Scheduler lag probe starting"
    );

    loop {
        if *phase.borrow_and_update() != Phase::Running {
            break;
        }

        let deadline = Instant::now() + period;
        tokio::select! {
            _ = time::sleep_until(deadline) => {
                let lag = Instant::now().saturating_duration_since(deadline);
                registry.record_scheduler_lag(lag);
            }
            changed = phase.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Scheduler lag probe stopped");
}
