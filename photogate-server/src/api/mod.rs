//! Admin API
//!
//! Read-only endpoints describing the gateway itself, mounted under
//! `/api/gateway`. Capability traffic never passes through here.

mod gateway;
mod metrics;


use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

use crate::state::AppState;

pub use metrics::get_metrics;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(gateway::get_status))
        .route("/readiness", get(gateway::get_readiness))
        .route("/capabilities", get(gateway::list_capabilities))
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}
