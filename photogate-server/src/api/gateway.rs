use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use photogate_core::gateway::capability::CapabilityInfo;
use photogate_types::models::{Mode, ReadinessSnapshot};

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub mode: Mode,
    pub read_only: bool,
    pub backend: Option<String>,
    pub readiness: ReadinessSnapshot,
    pub capabilities: usize,
    pub uptime_secs: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let decision = state.current_mode();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: decision.mode,
        read_only: decision.read_only,
        backend: decision.backend.map(|url| url.to_string()),
        readiness: state.readiness().snapshot(),
        capabilities: state.registry().len(),
        uptime_secs: state.uptime().as_secs(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadinessQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub health_url: String,
    #[serde(flatten)]
    pub snapshot: ReadinessSnapshot,
}

/// Cached readiness; `?refresh=true` runs a probe first.
pub async fn get_readiness(
    State(state): State<AppState>,
    Query(query): Query<ReadinessQuery>,
) -> Json<ReadinessResponse> {
    let snapshot = if query.refresh {
        state.refresh_readiness().await
    } else {
        state.readiness().snapshot()
    };

    Json(ReadinessResponse { health_url: state.probe().health_url().to_string(), snapshot })
}

#[derive(Serialize)]
pub struct CapabilitiesResponse {
    pub count: usize,
    pub capabilities: Vec<CapabilityInfo>,
}

pub async fn list_capabilities(State(state): State<AppState>) -> Json<CapabilitiesResponse> {
    let capabilities = state.registry().describe();
    Json(CapabilitiesResponse { count: capabilities.len(), capabilities })
}
