//! # Photogate Types
//!
//! Core types, models, and error definitions for the Photogate backend gateway.
//!
//! - **`error`** - Error taxonomy and the uniform `ErrorEnvelope` failure shape
//! - **`models`** - Mode decisions, readiness snapshots, deployment signals, configuration
//!
//! ## Architecture Role
//!
//! `photogate-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!         photogate-types (this crate)
//!                 │
//!                 ▼
//!          photogate-core
//!                 │
//!                 ▼
//!         photogate-server
//! ```
//!
//! Everything here is plain data: serializable, cheap to clone, free of I/O.

pub mod error;
pub mod models;

pub use error::{ConfigError, ErrorCategory, ErrorEnvelope, GatewayError, Result};

pub use models::{
    DeploymentSignals, GatewayConfig, HostingPlatform, Mode, ModeDecision, ProbeConfig,
    ReadinessSnapshot, ReadinessState, RetryConfig,
};
