//! Typed error definitions for Photogate.
//!
//! Every externally visible gateway failure is shaped into exactly one
//! [`ErrorEnvelope`], whose [`ErrorCategory`] is stable across releases:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants

mod config;
mod gateway;

pub use config::ConfigError;
pub use gateway::{GatewayError, UnavailableCause};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Connection refused, timeout, or retries exhausted.
    BackendUnavailable,
    /// Backend answered with a definitive error status that is relayed as-is.
    BackendRejected,
    /// A deadline elapsed; surfaced distinctly when diagnosing latency.
    Timeout,
    /// Malformed inbound request, rejected before any network call.
    InvalidInput,
    /// Operation intentionally unavailable in the current mode.
    CapabilityDisabled,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BackendUnavailable => "backend_unavailable",
            Self::BackendRejected => "backend_rejected",
            Self::Timeout => "timeout",
            Self::InvalidInput => "invalid_input",
            Self::CapabilityDisabled => "capability_disabled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform failure body returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub category: ErrorCategory,
    pub http_status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    pub fn new(category: ErrorCategory, http_status: u16, message: impl Into<String>) -> Self {
        Self { category, http_status, message: message.into(), details: None }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Standard Result type using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;
