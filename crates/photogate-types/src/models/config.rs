//! Gateway configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Retry budget for idempotent capabilities. Mutations always get zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[validate(range(max = 10_u32))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff unit: retry k sleeps `base_delay_ms * (k + 1)`
    #[validate(range(min = 1_u64, max = 60_000_u64))]
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: default_max_retries(), base_delay_ms: default_base_delay_ms() }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Readiness probing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ProbeConfig {
    /// Bound on a single health check
    #[validate(range(min = 50_u64, max = 60_000_u64))]
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    /// Background refresh of the readiness cache; 0 disables the refresher
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// How long `serve` waits for the backend before accepting traffic; 0 skips
    #[validate(range(max = 3600_u64))]
    #[serde(default)]
    pub startup_wait_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            refresh_interval_secs: default_refresh_interval_secs(),
            startup_wait_secs: 0,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

/// Full gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GatewayConfig {
    /// Bind to 0.0.0.0 instead of loopback
    #[serde(default)]
    pub allow_lan_access: bool,
    /// Port the gateway listens on
    #[validate(range(min = 1_u16))]
    #[serde(default = "default_port")]
    pub port: u16,
    /// Local compute backend
    #[serde(default = "default_backend_url")]
    pub backend_url: Url,
    /// Health surface on the backend
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Per-attempt deadline for forwarded requests
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,
    #[serde(default)]
    #[validate(nested)]
    pub probe: ProbeConfig,
    /// Directory of `<capability>.json` files overriding built-in fallback payloads
    #[serde(default)]
    pub fallback_dir: Option<PathBuf>,
    /// Inbound body limit (uploads)
    #[validate(range(min = 1_usize, max = 4096_usize))]
    #[serde(default = "default_max_body_mb")]
    pub max_body_mb: usize,
    /// Browser origins allowed in addition to the local dev servers
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            backend_url: default_backend_url(),
            health_path: default_health_path(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryConfig::default(),
            probe: ProbeConfig::default(),
            fallback_dir: None,
            max_body_mb: default_max_body_mb(),
            cors_origins: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Get the bind address based on LAN access setting.
    pub fn get_bind_address(&self) -> String {
        if self.allow_lan_access {
            "0.0.0.0".to_string()
        } else {
            "127.0.0.1".to_string()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }
}

pub const fn default_port() -> u16 {
    3000
}

pub const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    500
}

const fn default_probe_timeout_ms() -> u64 {
    2000
}

const fn default_refresh_interval_secs() -> u64 {
    15
}

const fn default_max_body_mb() -> usize {
    100
}

fn default_health_path() -> String {
    "/health".to_string()
}

#[allow(clippy::expect_used, reason = "constant URL literal")]
fn default_backend_url() -> Url {
    Url::parse("http://127.0.0.1:8000").expect("static backend URL is valid")
}
