//! Operating mode of the gateway for the current deployment.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Operating posture of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Forward to the local compute backend
    Live,
    /// No backend; serve static fallback data
    Demo,
    /// Forward to a configured remote backend
    RemoteHosted,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Demo => write!(f, "demo"),
            Mode::RemoteHosted => write!(f, "remote_hosted"),
        }
    }
}

/// Per-request routing decision. Never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDecision {
    pub mode: Mode,
    pub read_only: bool,
    /// Base URL requests are forwarded to; `None` in Demo mode.
    pub backend: Option<Url>,
}

impl ModeDecision {
    pub fn live(backend: Url) -> Self {
        Self { mode: Mode::Live, read_only: false, backend: Some(backend) }
    }

    pub fn demo() -> Self {
        Self { mode: Mode::Demo, read_only: true, backend: None }
    }

    pub fn remote_hosted(backend: Url) -> Self {
        Self { mode: Mode::RemoteHosted, read_only: true, backend: Some(backend) }
    }

    pub fn is_demo(&self) -> bool {
        self.mode == Mode::Demo
    }

    /// Human-readable summary, same wording the backend's mode endpoint uses.
    pub fn message(&self) -> &'static str {
        match self.mode {
            Mode::Demo => "Demo mode - read only",
            Mode::RemoteHosted => "Remote backend - read only",
            Mode::Live => "Full mode - all features enabled",
        }
    }
}
