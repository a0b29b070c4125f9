//! Core domain models for Photogate.

mod config;
mod deployment;
mod mode;
mod readiness;

pub use config::{GatewayConfig, ProbeConfig, RetryConfig};
pub use deployment::{DeploymentSignals, HostingPlatform};
pub use mode::{Mode, ModeDecision};
pub use readiness::{ReadinessSnapshot, ReadinessState};
