use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use photogate_core::gateway::prometheus;

use crate::state::AppState;

/// Prometheus text exposition.
pub async fn get_metrics(State(state): State<AppState>) -> Response<Body> {
    prometheus::set_backend_ready(state.readiness().is_reachable());
    let metrics = prometheus::render_metrics();

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")], metrics).into_response()
}
