//! Shutdown coordination for the service.

use std::sync::Arc;

use tokio::sync::watch;

/// Lifecycle phase of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting connections and serving requests.
    Running,
    /// No new connections; in-flight requests are finishing.
    Draining,
    /// Server has stopped, either drained or forced.
    Terminated,
}

/// Coordinator for graceful shutdown.
///
/// Holds the current [`Phase`] in a watch channel so that every long-running
/// task can observe transitions. Phases only move forward.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Phase>>,
}

impl Shutdown {
    /// Create a new coordinator in the `Running` phase.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Subscribe to phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    /// Begin draining. Returns false if shutdown was already under way.
    pub fn trigger(&self) -> bool {
        self.advance(Phase::Draining)
    }

    /// Mark the server as stopped. Also used to cut a drain short.
    pub fn terminate(&self) -> bool {
        self.advance(Phase::Terminated)
    }

    fn advance(&self, to: Phase) -> bool {
        self.tx.send_if_modified(|phase| {
            let next = match (*phase, to) {
                (Phase::Running, Phase::Draining) => Phase::Draining,
                (Phase::Running | Phase::Draining, Phase::Terminated) => Phase::Terminated,
                _ => return false,
            };
            tracing::debug!(from = ?*phase, to = ?next, "Lifecycle transition");
            *phase = next;
            true
        })
    }

    /// Resolve once the phase has left `Running`.
    pub async fn draining(&self) {
        self.wait_until(|phase| phase != Phase::Running).await
    }

    /// Resolve once the phase is `Terminated`.
    pub async fn terminated(&self) {
        self.wait_until(|phase| phase == Phase::Terminated).await
    }

    async fn wait_until(&self, done: impl Fn(Phase) -> bool) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|phase| done(*phase)).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
