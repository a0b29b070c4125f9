//! Retrying request client for the compute backend.
//!
//! One logical request = up to `max_retries + 1` attempts, each bounded by the
//! spec's timeout. Backoff is linear: retry `k` (0-based) sleeps
//! `base_delay * (k + 1)`.
//!
//! | Outcome                      | Action                                  |
//! |------------------------------|-----------------------------------------|
//! | 2xx, 400, 404, other non-5xx | return immediately                      |
//! | 5xx                          | retry while budget remains, else return |
//! | connect / timeout failure    | retry while budget remains, else `Err`  |
//!
//! Non-idempotent specs never retry, whatever budget they carry.

mod error;
mod request_executor;


pub use error::NetworkError;
pub use request_executor::forwardable_headers;

use bytes::Bytes;
use futures::Stream;
use photogate_types::models::RetryConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Retry budget and backoff unit for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::ZERO }
    }

    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Configured budget for idempotent calls, zero for everything else.
    pub fn from_config(config: &RetryConfig, idempotent: bool) -> Self {
        if idempotent {
            Self::new(config.max_retries, config.base_delay())
        } else {
            Self::none()
        }
    }

    /// Sleep before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }
}

/// Outbound body, already canonicalized.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Re-serialized with `application/json`
    Json(serde_json::Value),
    /// Passed through untouched (uploads, form posts, text)
    Raw { bytes: Bytes, content_type: Option<HeaderValue> },
}

/// Immutable description of one logical backend call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub target: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub idempotent: bool,
    pub trace_id: String,
}

impl RequestSpec {
    pub fn new(method: Method, target: Url) -> Self {
        let idempotent = method.is_idempotent();
        Self {
            target,
            method,
            headers: HeaderMap::new(),
            body: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::none(),
            idempotent,
            trace_id: String::from("-"),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<RequestBody>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Retry budget actually honoured by the client.
    pub fn effective_retries(&self) -> u32 {
        if self.idempotent {
            self.retry.max_retries
        } else {
            0
        }
    }
}

/// Backend response plus how many attempts it took.
#[derive(Debug)]
pub struct BackendResponse {
    response: Response,
    attempts: u32,
}

impl BackendResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Buffer the body, bounded by `timeout`.
    pub async fn bytes_within(self, timeout: Duration) -> Result<Bytes, NetworkError> {
        let attempts = self.attempts;
        match tokio::time::timeout(timeout, self.response.bytes()).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(NetworkError::from_reqwest(&e).with_attempts(attempts)),
            Err(_elapsed) => Err(NetworkError::timeout(timeout).with_attempts(attempts)),
        }
    }

    /// Hand the body over as a stream for binary relay.
    pub fn into_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static {
        self.response.bytes_stream()
    }
}

/// 5xx is the only status class worth another attempt.
fn is_retryable_status(status: StatusCode) -> bool {
    status.as_u16() >= 500
}

/// Build the shared HTTP client. Per-attempt deadlines come from each
/// `RequestSpec`, so only connection setup is bounded here.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .tcp_nodelay(true)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}

#[derive(Debug, Clone)]
pub struct RetryingRequestClient {
    http: Client,
}

impl RetryingRequestClient {
    /// Accepts a pre-built `reqwest::Client` so one connection pool is shared
    /// between the gateway and the readiness probe.
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    pub fn http_client(&self) -> &Client {
        &self.http
    }

    pub async fn send(&self, spec: &RequestSpec) -> Result<BackendResponse, NetworkError> {
        let max_retries = spec.effective_retries();
        if max_retries < spec.retry.max_retries {
            debug!(
                "[{}] {} {} is not idempotent, retry budget {} ignored",
                spec.trace_id, spec.method, spec.target, spec.retry.max_retries
            );
        }

        let mut attempt: u32 = 0;
        loop {
            match request_executor::execute_once(&self.http, spec).await {
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) || attempt >= max_retries {
                        if attempt > 0 {
                            debug!(
                                "[{}] {} settled with {} after {} attempts",
                                spec.trace_id,
                                spec.target.path(),
                                status,
                                attempt + 1
                            );
                        }
                        return Ok(BackendResponse { response, attempts: attempt + 1 });
                    }

                    let delay = spec.retry.delay_for(attempt);
                    info!(
                        "[{}] Retry with linear backoff: status={}, attempt={}/{}, delay={}ms",
                        spec.trace_id,
                        status.as_u16(),
                        attempt + 1,
                        max_retries,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                },
                Err(err) => {
                    if attempt >= max_retries {
                        warn!(
                            "[{}] {} {} failed after {} attempts: {}",
                            spec.trace_id,
                            spec.method,
                            spec.target.path(),
                            attempt + 1,
                            err.message
                        );
                        return Err(err.with_attempts(attempt + 1));
                    }

                    let delay = spec.retry.delay_for(attempt);
                    warn!(
                        "[{}] Transport error ({}), retry {}/{} after {}ms",
                        spec.trace_id,
                        err.kind.as_str(),
                        attempt + 1,
                        max_retries,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                },
            }
            attempt += 1;
        }
    }
}
