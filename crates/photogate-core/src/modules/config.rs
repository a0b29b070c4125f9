//! Configuration loading and deployment-signal capture.

use photogate_types::models::{DeploymentSignals, GatewayConfig, HostingPlatform};
use photogate_types::ConfigError;
use std::fs;
use std::path::Path;
use url::Url;
use validator::Validate;

/// Environment variable forcing demo mode.
pub const DEMO_MODE_ENV: &str = "PHOTOGATE_DEMO_MODE";
/// Environment variable naming the remote backend for serverless deployments.
pub const REMOTE_BACKEND_ENV: &str = "PHOTOGATE_REMOTE_BACKEND_URL";

/// Hosting indicators set by serverless platforms, checked in order.
const SERVERLESS_INDICATORS: &[(&str, &str)] = &[
    ("VERCEL", "vercel"),
    ("NETLIFY", "netlify"),
    ("AWS_LAMBDA_FUNCTION_NAME", "aws_lambda"),
    ("PHOTOGATE_SERVERLESS", "generic"),
];

/// Load the gateway configuration.
///
/// No path means defaults. A missing file is an error when a path was given
/// explicitly, since silently serving with defaults would hide a typo.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = match path {
        None => GatewayConfig::default(),
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path: path.display().to_string() });
            }
            let content =
                fs::read_to_string(path).map_err(|e| ConfigError::from_io_error(path, &e))?;
            serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?
        },
    };
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), ConfigError> {
    config.validate().map_err(|errors| {
        let field = errors.errors().keys().next().map(|k| k.to_string()).unwrap_or_default();
        ConfigError::ValidationError { field, message: errors.to_string() }
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Capture deployment signals from an environment lookup.
pub fn deployment_signals_from_lookup<F>(lookup: F) -> Result<DeploymentSignals, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let force_demo = lookup(DEMO_MODE_ENV).is_some_and(|v| is_truthy(&v));

    let hosting = SERVERLESS_INDICATORS
        .iter()
        .find(|(var, _)| lookup(var).is_some_and(|v| !v.trim().is_empty() && v.trim() != "0"))
        .map(|(_, provider)| HostingPlatform::Serverless { provider: (*provider).to_string() })
        .unwrap_or_default();

    let remote_backend_url = match lookup(REMOTE_BACKEND_ENV).filter(|v| !v.trim().is_empty()) {
        Some(raw) => Some(Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
            field: REMOTE_BACKEND_ENV.to_string(),
            message: e.to_string(),
        })?),
        None => None,
    };

    Ok(DeploymentSignals { force_demo, hosting, remote_backend_url })
}

/// Capture deployment signals from the process environment. Called once at startup.
pub fn deployment_signals_from_env() -> Result<DeploymentSignals, ConfigError> {
    deployment_signals_from_lookup(|key| std::env::var(key).ok())
}
