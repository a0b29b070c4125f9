//! Test helpers for photogate-server unit tests.

use url::Url;

use photogate_types::models::{DeploymentSignals, GatewayConfig};

use crate::state::AppState;

/// `AppState` forwarding to `backend` in live mode.
pub fn test_app_state(backend: &str) -> AppState {
    test_app_state_with(backend, DeploymentSignals::default())
}

pub fn test_app_state_with(backend: &str, signals: DeploymentSignals) -> AppState {
    let config = GatewayConfig {
        backend_url: Url::parse(backend).expect("valid backend URL"),
        ..GatewayConfig::default()
    };
    AppState::from_config(config, signals).expect("failed to create test AppState")
}
