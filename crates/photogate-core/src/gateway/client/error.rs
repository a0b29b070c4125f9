//! Transport-level failures of the retrying client.

use photogate_types::error::{GatewayError, UnavailableCause};
use std::time::Duration;
use thiserror::Error;

/// Connection-level failure after the retry budget was spent.
///
/// Carries the last underlying cause; HTTP error statuses are not
/// `NetworkError`s, they come back as responses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} failure after {attempts} attempt(s): {message}", kind.as_str())]
pub struct NetworkError {
    pub kind: UnavailableCause,
    pub message: String,
    pub attempts: u32,
}

impl NetworkError {
    pub(crate) fn timeout(after: Duration) -> Self {
        Self {
            kind: UnavailableCause::Timeout,
            message: format!("no response within {}ms", after.as_millis()),
            attempts: 1,
        }
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            UnavailableCause::Timeout
        } else if err.is_connect() {
            UnavailableCause::Connect
        } else if err.is_body() || err.is_decode() {
            UnavailableCause::Body
        } else {
            UnavailableCause::Other
        };
        Self { kind, message: describe_chain(err), attempts: 1 }
    }

    #[must_use]
    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == UnavailableCause::Timeout
    }
}

impl From<NetworkError> for GatewayError {
    fn from(err: NetworkError) -> Self {
        GatewayError::BackendUnavailable {
            message: err.message,
            cause: err.kind,
            attempts: err.attempts,
        }
    }
}

/// reqwest hides the interesting part (e.g. "Connection refused") in the source chain.
fn describe_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
