//! # Photogate Core
//!
//! Gateway logic sitting between the photo UI and the compute backend.
//!
//! ## Architecture
//!
//! ```text
//! photogate-core/src/
//! ├── gateway/
//! │   ├── client/       # RetryingRequestClient (timeout, linear backoff)
//! │   ├── readiness/    # ReadinessProbe + advisory ReadinessTracker
//! │   ├── mode.rs       # pure ModeResolver
//! │   ├── capability/   # registry, fallback payloads, built-in catalog
//! │   ├── inbound.rs    # request capture and input validation
//! │   ├── route.rs      # GatewayRoute state machine
//! │   ├── relay.rs      # relaying and ErrorEnvelope responses
//! │   ├── server.rs     # axum router built from the registry
//! │   ├── middleware/   # CORS
//! │   └── prometheus.rs # metrics
//! └── modules/
//!     ├── config.rs     # config file + deployment signals
//!     └── logger.rs     # tracing setup
//! ```

#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::float_cmp,
        clippy::assertions_on_result_states
    )
)]

pub mod gateway;
pub mod modules;

pub use gateway::{
    build_gateway_router, default_registry, CapabilityRegistry, GatewayRoute, ModeResolver,
    ReadinessProbe, ReadinessTracker, RetryingRequestClient,
};
