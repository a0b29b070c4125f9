//! Application State
//!
//! Holds the gateway route, capability registry and readiness probe shared
//! by the gateway router, the admin API and the CLI commands.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use photogate_core::gateway::capability::load_fallback_overrides;
use photogate_core::gateway::client::build_http_client;
use photogate_core::{
    default_registry, CapabilityRegistry, GatewayRoute, ModeResolver, ReadinessProbe,
    ReadinessTracker, RetryingRequestClient,
};
use photogate_types::models::{DeploymentSignals, GatewayConfig, ModeDecision, ReadinessSnapshot};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config: GatewayConfig,
    pub route: GatewayRoute,
    pub registry: CapabilityRegistry,
    pub probe: ReadinessProbe,
    pub started_at: Instant,
}

impl AppState {
    /// Wire up the gateway from configuration and the deployment signals
    /// captured at startup.
    pub fn from_config(config: GatewayConfig, signals: DeploymentSignals) -> Result<Self> {
        let http = build_http_client(CONNECT_TIMEOUT).context("Failed to build HTTP client")?;

        let probe = ReadinessProbe::for_backend(
            http.clone(),
            &config.backend_url,
            &config.health_path,
            config.probe.timeout(),
        )
        .with_context(|| format!("Invalid health path '{}'", config.health_path))?;

        let mut registry = default_registry().context("Built-in capability table is invalid")?;
        if let Some(dir) = config.fallback_dir.as_deref() {
            match load_fallback_overrides(&mut registry, dir) {
                Ok(count) => info!("📦 Applied {} fallback overrides from {}", count, dir.display()),
                Err(e) => warn!("⚠️ Could not read fallback directory: {}", e),
            }
        }

        let route = GatewayRoute::new(
            RetryingRequestClient::new(http),
            ModeResolver::new(signals, config.backend_url.clone()),
            ReadinessTracker::new(),
            config.retry,
            config.request_timeout(),
        );

        Ok(Self::new_with_components(config, route, registry, probe))
    }

    /// Create AppState with pre-built components (tests, embedding)
    pub fn new_with_components(
        config: GatewayConfig,
        route: GatewayRoute,
        registry: CapabilityRegistry,
        probe: ReadinessProbe,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                route,
                registry,
                probe,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn route(&self) -> &GatewayRoute {
        &self.inner.route
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.inner.registry
    }

    pub fn probe(&self) -> &ReadinessProbe {
        &self.inner.probe
    }

    pub fn readiness(&self) -> &Arc<ReadinessTracker> {
        self.inner.route.readiness()
    }

    pub fn current_mode(&self) -> ModeDecision {
        self.inner.route.current_mode()
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Probe the backend now and store the outcome.
    pub async fn refresh_readiness(&self) -> ReadinessSnapshot {
        self.readiness().refresh(&self.inner.probe).await
    }
}
