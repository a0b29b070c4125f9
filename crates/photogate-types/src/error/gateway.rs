//! Gateway failure taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use super::{ErrorCategory, ErrorEnvelope};
use crate::models::Mode;

/// Why the backend could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableCause {
    /// Connection refused, reset, or DNS failure
    Connect,
    /// Per-attempt deadline elapsed
    Timeout,
    /// Response body could not be read
    Body,
    /// Anything else reported by the transport
    Other,
}

impl UnavailableCause {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Body => "body",
            Self::Other => "other",
        }
    }
}

/// Errors produced while serving one gateway request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum GatewayError {
    /// Backend unreachable after the retry budget was spent
    #[error("Backend unavailable ({}): {message}", cause.as_str())]
    BackendUnavailable { message: String, cause: UnavailableCause, attempts: u32 },

    /// Backend answered with a non-success status
    #[error("Backend rejected request with {status}: {message}")]
    BackendRejected { status: u16, message: String, details: Option<serde_json::Value> },

    /// A deadline elapsed
    #[error("Timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Inbound request failed validation
    #[error("Invalid input: {message}")]
    InvalidInput { message: String, details: Option<serde_json::Value> },

    /// Capability is switched off in the current mode
    #[error("Capability {capability} disabled in {mode} mode")]
    CapabilityDisabled { capability: String, mode: Mode },
}

impl GatewayError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into(), details: None }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BackendUnavailable { .. } => ErrorCategory::BackendUnavailable,
            Self::BackendRejected { .. } => ErrorCategory::BackendRejected,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::InvalidInput { .. } => ErrorCategory::InvalidInput,
            Self::CapabilityDisabled { .. } => ErrorCategory::CapabilityDisabled,
        }
    }

    /// HTTP status code reported to the caller.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::BackendUnavailable { .. } => 503,
            Self::BackendRejected { status, .. } => *status,
            Self::Timeout { .. } => 504,
            Self::InvalidInput { .. } => 400,
            Self::CapabilityDisabled { .. } => 403,
        }
    }

    /// True when a read-only soft-fallback capability may substitute its payload.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. } | Self::Timeout { .. })
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        let envelope =
            ErrorEnvelope::new(self.category(), self.http_status_code(), self.public_message());
        match self {
            Self::BackendUnavailable { cause, attempts, .. } => envelope
                .with_details(json!({ "cause": cause.as_str(), "attempts": attempts })),
            Self::BackendRejected { details, .. } | Self::InvalidInput { details, .. } => {
                match details {
                    Some(d) => envelope.with_details(d.clone()),
                    None => envelope,
                }
            },
            Self::Timeout { after_ms } => envelope.with_details(json!({ "after_ms": after_ms })),
            Self::CapabilityDisabled { capability, mode } => {
                envelope.with_details(json!({ "capability": capability, "mode": mode }))
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BackendUnavailable { .. } => {
                "The compute backend is not reachable right now. It may still be starting."
                    .to_string()
            },
            Self::BackendRejected { message, .. } | Self::InvalidInput { message, .. } => {
                message.clone()
            },
            Self::Timeout { after_ms } => format!("Backend did not answer within {after_ms}ms"),
            Self::CapabilityDisabled { mode: Mode::Demo, .. } => {
                "Operation not allowed in demo mode. This is a read-only demo deployment."
                    .to_string()
            },
            Self::CapabilityDisabled { .. } => {
                "Operation not allowed on this read-only deployment.".to_string()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        let unavailable = GatewayError::BackendUnavailable {
            message: "connection refused".to_string(),
            cause: UnavailableCause::Connect,
            attempts: 4,
        };
        assert_eq!(unavailable.http_status_code(), 503);
        assert_eq!(GatewayError::invalid_input("bad").http_status_code(), 400);
        assert_eq!(GatewayError::Timeout { after_ms: 10 }.http_status_code(), 504);
        assert_eq!(
            GatewayError::CapabilityDisabled {
                capability: "silos.create".to_string(),
                mode: Mode::Demo
            }
            .http_status_code(),
            403
        );
    }

    #[test]
    fn test_rejected_keeps_backend_status() {
        let err = GatewayError::BackendRejected {
            status: 404,
            message: "Media not found".to_string(),
            details: Some(json!({"detail": "Media not found"})),
        };
        let envelope = err.to_envelope();
        assert_eq!(envelope.http_status, 404);
        assert_eq!(envelope.category, ErrorCategory::BackendRejected);
        assert_eq!(envelope.details.unwrap()["detail"], "Media not found");
    }

    #[test]
    fn test_unavailable_envelope_reports_cause() {
        let err = GatewayError::BackendUnavailable {
            message: "deadline elapsed".to_string(),
            cause: UnavailableCause::Timeout,
            attempts: 1,
        };
        let envelope = err.to_envelope();
        assert_eq!(envelope.category, ErrorCategory::BackendUnavailable);
        assert_eq!(envelope.details.unwrap()["cause"], "timeout");
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_demo_disabled_message() {
        let err =
            GatewayError::CapabilityDisabled { capability: "x".to_string(), mode: Mode::Demo };
        assert!(err.to_envelope().message.contains("demo mode"));
        let remote = GatewayError::CapabilityDisabled {
            capability: "x".to_string(),
            mode: Mode::RemoteHosted,
        };
        assert!(remote.to_envelope().message.contains("read-only deployment"));
    }
}
