//! Advisory readiness cache.

use chrono::Utc;
use parking_lot::RwLock;
use photogate_types::models::{ReadinessSnapshot, ReadinessState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::probe::{ProbeOutcome, ReadinessProbe};
use crate::gateway::prometheus;

/// Last observed backend readiness, shared process-wide.
///
/// Reads never perform I/O. The snapshot is advisory: routing still tolerates
/// a backend that went away since the last probe.
pub struct ReadinessTracker {
    snapshot: RwLock<ReadinessSnapshot>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
}

impl ReadinessTracker {
    pub fn new() -> Arc<Self> {
        let (shutdown_tx, _) = tokio::sync::watch::channel(false);
        Arc::new(Self { snapshot: RwLock::new(ReadinessSnapshot::default()), shutdown_tx })
    }

    pub fn snapshot(&self) -> ReadinessSnapshot {
        self.snapshot.read().clone()
    }

    /// Whether the last settled probe succeeded. `Unknown` counts as unreachable.
    pub fn is_reachable(&self) -> bool {
        self.snapshot.read().is_reachable()
    }

    /// Run one probe and record its outcome.
    pub async fn refresh(&self, probe: &ReadinessProbe) -> ReadinessSnapshot {
        self.snapshot.write().state = ReadinessState::Checking;
        let outcome = probe.check_within(probe.timeout()).await;
        self.record(outcome)
    }

    /// Settle the in-flight check with `outcome`.
    pub fn record(&self, outcome: ProbeOutcome) -> ReadinessSnapshot {
        let mut guard = self.snapshot.write();
        let previous = guard.last_outcome;

        guard.state =
            if outcome.healthy { ReadinessState::Ready } else { ReadinessState::Unreachable };
        guard.last_outcome = Some(outcome.healthy);
        guard.checked_at = Some(Utc::now());
        guard.latency_ms = Some(outcome.latency.as_millis() as u64);
        guard.consecutive_failures =
            if outcome.healthy { 0 } else { guard.consecutive_failures.saturating_add(1) };

        match (previous, outcome.healthy) {
            (Some(false) | None, true) => {
                info!("Backend became ready ({}ms)", outcome.latency.as_millis());
            },
            (Some(true), false) => {
                warn!("Backend became unreachable");
            },
            (None, false) => {
                info!("Backend not reachable yet");
            },
            _ => {},
        }

        prometheus::set_backend_ready(outcome.healthy);
        guard.clone()
    }

    /// Periodically refresh the snapshot until [`Self::shutdown`] is called.
    pub fn start_refresher(
        self: &Arc<Self>,
        probe: ReadinessProbe,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let tracker = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tracker.refresh(&probe).await;

                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.changed() => {
                        info!("Readiness refresher shutting down");
                        break;
                    }
                }
            }
        })
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
