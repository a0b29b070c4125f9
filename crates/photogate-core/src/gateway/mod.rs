//! Backend gateway: forwarding, resilience and mode handling.
//!
//! ```text
//! inbound ─► GatewayRoute ─► ModeResolver ─┬─► fallback payload
//!                                          └─► RetryingRequestClient ─► backend
//!                                                        │
//!                                              relay / ErrorEnvelope ─► caller
//! ```

pub mod capability;
pub mod client;
pub mod inbound;
pub mod middleware;
pub mod mode;
pub mod prometheus;
pub mod readiness;
pub mod relay;
pub mod route;
pub mod server;

pub use capability::{
    default_registry, Capability, CapabilityKind, CapabilityRegistry, FailurePolicy,
    FallbackPayload, ResponseKind,
};
pub use client::{RequestSpec, RetryPolicy, RetryingRequestClient};
pub use inbound::InboundRequest;
pub use mode::ModeResolver;
pub use readiness::{ReadinessProbe, ReadinessTracker};
pub use route::GatewayRoute;
pub use server::build_gateway_router;
