//! The single parameterized gateway route.
//!
//! Per-request state machine:
//!
//! ```text
//! Received ──► ModeResolved ──┬──► FallbackServed
//!                             └──► Forwarding ──┬──► Relayed
//!                                               └──► FailedMapped
//! ```
//!
//! Terminal states are logged and counted; there is no re-entry.

use axum::response::Response;
use photogate_types::error::UnavailableCause;
use photogate_types::models::{Mode, ModeDecision, RetryConfig};
use photogate_types::GatewayError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::capability::{Capability, CapabilityKind, FailurePolicy, ResponseKind};
use super::client::{
    forwardable_headers, NetworkError, RequestSpec, RetryPolicy, RetryingRequestClient,
};
use super::inbound::InboundRequest;
use super::mode::ModeResolver;
use super::readiness::ReadinessTracker;
use super::{prometheus, relay};

/// Terminal state of one gateway request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FallbackServed,
    Relayed,
    FailedMapped,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FallbackServed => "fallback_served",
            Self::Relayed => "relayed",
            Self::FailedMapped => "failed_mapped",
        }
    }
}

/// Settled response plus bookkeeping for logs and metrics.
struct Settled {
    response: Response,
    outcome: Outcome,
    attempts: u32,
    fallback_reason: Option<&'static str>,
}

impl Settled {
    fn fallback(response: Response, reason: &'static str, attempts: u32) -> Self {
        Self { response, outcome: Outcome::FallbackServed, attempts, fallback_reason: Some(reason) }
    }

    fn relayed(response: Response, attempts: u32) -> Self {
        Self { response, outcome: Outcome::Relayed, attempts, fallback_reason: None }
    }

    fn failed(err: &GatewayError, attempts: u32) -> Self {
        Self {
            response: relay::error_response(err),
            outcome: Outcome::FailedMapped,
            attempts,
            fallback_reason: None,
        }
    }
}

/// Forwards capability calls to the backend chosen by the mode resolver.
#[derive(Clone)]
pub struct GatewayRoute {
    client: RetryingRequestClient,
    resolver: ModeResolver,
    readiness: Arc<ReadinessTracker>,
    retry: RetryConfig,
    request_timeout: Duration,
}

impl GatewayRoute {
    pub fn new(
        client: RetryingRequestClient,
        resolver: ModeResolver,
        readiness: Arc<ReadinessTracker>,
        retry: RetryConfig,
        request_timeout: Duration,
    ) -> Self {
        Self { client, resolver, readiness, retry, request_timeout }
    }

    pub fn resolver(&self) -> &ModeResolver {
        &self.resolver
    }

    pub fn readiness(&self) -> &Arc<ReadinessTracker> {
        &self.readiness
    }

    /// Fresh decision from the readiness cache's last settled outcome.
    pub fn current_mode(&self) -> ModeDecision {
        self.resolver.resolve(self.readiness.is_reachable())
    }

    pub async fn handle(&self, capability: &Capability, inbound: InboundRequest) -> Response {
        let trace_id = short_trace_id();
        let started = Instant::now();
        let decision = self.current_mode();

        let settled = self.dispatch(capability, &decision, inbound, &trace_id).await;

        let status = settled.response.status().as_u16();
        let elapsed = started.elapsed();
        info!(
            "[{}] capability={} mode={} outcome={} status={} attempts={} {}ms",
            trace_id,
            capability.name,
            decision.mode,
            settled.outcome.as_str(),
            status,
            settled.attempts,
            elapsed.as_millis()
        );

        prometheus::record_request(&capability.name, settled.outcome.as_str(), status, elapsed);
        prometheus::record_backend_attempts(&capability.name, settled.attempts);
        if let Some(reason) = settled.fallback_reason {
            prometheus::record_fallback(&capability.name, reason);
        }

        settled.response
    }

    async fn dispatch(
        &self,
        capability: &Capability,
        decision: &ModeDecision,
        inbound: InboundRequest,
        trace_id: &str,
    ) -> Settled {
        if decision.read_only && capability.kind == CapabilityKind::Mutation {
            let err = disabled(capability, decision.mode);
            return Settled::failed(&err, 0);
        }

        let Some(backend) = decision.backend.as_ref() else {
            return demo_answer(capability, decision.mode, &inbound);
        };

        let body = match inbound.validate(capability) {
            Ok(body) => body,
            Err(err) => {
                debug!("[{}] {} rejected before forwarding: {}", trace_id, capability.name, err);
                return Settled::failed(&err, 0);
            },
        };

        let target = backend_target(backend, &inbound.path, inbound.raw_query.as_deref());
        let timeout = capability.timeout.unwrap_or(self.request_timeout);
        let spec = RequestSpec::new(capability.method.clone(), target)
            .idempotent(capability.idempotent)
            .with_headers(forwardable_headers(&inbound.headers))
            .with_body(body)
            .with_timeout(timeout)
            .with_retry(RetryPolicy::from_config(&self.retry, capability.idempotent))
            .with_trace_id(trace_id);

        match self.client.send(&spec).await {
            Ok(backend_response) => {
                let attempts = backend_response.attempts();
                let status = backend_response.status();

                if status.is_success() || status == reqwest::StatusCode::NOT_MODIFIED {
                    let relayed = match capability.response {
                        ResponseKind::Binary => Ok(relay::relay_streaming(backend_response)),
                        ResponseKind::Json => relay::relay_buffered(backend_response, timeout).await,
                    };
                    return match relayed {
                        Ok(response) => Settled::relayed(response, attempts),
                        Err(net) => {
                            let err = stalled_body(net, timeout);
                            self.on_failure(capability, &inbound, err, attempts, trace_id)
                        },
                    };
                }

                let body = backend_response.bytes_within(timeout).await.unwrap_or_default();
                let err = relay::rejected(status.as_u16(), &body);
                self.on_failure(capability, &inbound, err, attempts, trace_id)
            },
            Err(net) => {
                let attempts = net.attempts;
                self.on_failure(capability, &inbound, net.into(), attempts, trace_id)
            },
        }
    }

    /// Apply the capability's failure policy.
    fn on_failure(
        &self,
        capability: &Capability,
        inbound: &InboundRequest,
        err: GatewayError,
        attempts: u32,
        trace_id: &str,
    ) -> Settled {
        match (capability.policy, capability.fallback.as_ref()) {
            (FailurePolicy::AlwaysSucceed, Some(payload)) => {
                debug!("[{}] {} failure swallowed: {}", trace_id, capability.name, err);
                Settled::fallback(relay::json_payload(payload.render(inbound)), "telemetry", attempts)
            },
            (FailurePolicy::SoftFallback, Some(payload)) if err.is_unavailable() => {
                warn!(
                    "[{}] {} backend unavailable, serving fallback: {}",
                    trace_id, capability.name, err
                );
                Settled::fallback(
                    relay::json_payload(payload.render(inbound)),
                    "backend_unavailable",
                    attempts,
                )
            },
            _ => Settled::failed(&err, attempts),
        }
    }
}

/// Headers arrived but the body did not finish within the deadline.
fn stalled_body(net: NetworkError, timeout: Duration) -> GatewayError {
    match net.kind {
        UnavailableCause::Timeout => GatewayError::Timeout { after_ms: timeout.as_millis() as u64 },
        _ => net.into(),
    }
}

fn disabled(capability: &Capability, mode: Mode) -> GatewayError {
    GatewayError::CapabilityDisabled { capability: capability.name.clone(), mode }
}

/// No backend: serve the registered payload or refuse. Never touches the network.
fn demo_answer(capability: &Capability, mode: Mode, inbound: &InboundRequest) -> Settled {
    match capability.fallback.as_ref() {
        Some(payload) => Settled::fallback(relay::json_payload(payload.render(inbound)), "demo", 0),
        None => Settled::failed(&disabled(capability, mode), 0),
    }
}

/// Join the inbound path onto the backend base, keeping any base path prefix.
pub fn backend_target(base: &Url, path: &str, query: Option<&str>) -> Url {
    let mut target = base.clone();
    let prefix = base.path().trim_end_matches('/');
    target.set_path(&format!("{}{}", prefix, path));
    target.set_query(query);
    target
}

fn short_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(8).collect()
}
