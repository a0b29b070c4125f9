//! Backend readiness state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Liveness of the compute backend as last observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// No probe has run yet
    #[default]
    Unknown,
    /// A probe is in flight
    Checking,
    /// Last probe got a 2xx within its bound
    Ready,
    /// Last probe timed out, failed to connect, or got a non-2xx
    Unreachable,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::Unknown => write!(f, "unknown"),
            ReadinessState::Checking => write!(f, "checking"),
            ReadinessState::Ready => write!(f, "ready"),
            ReadinessState::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Advisory snapshot of backend readiness. Never a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadinessSnapshot {
    pub state: ReadinessState,
    /// Outcome of the last completed probe, kept while the next one is in flight.
    pub last_outcome: Option<bool>,
    pub checked_at: Option<DateTime<Utc>>,
    pub latency_ms: Option<u64>,
    pub consecutive_failures: u32,
}

impl ReadinessSnapshot {
    /// Whether the last settled probe found the backend healthy.
    pub fn is_reachable(&self) -> bool {
        self.last_outcome == Some(true)
    }
}
