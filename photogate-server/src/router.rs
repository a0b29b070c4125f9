use axum::{
    extract::DefaultBodyLimit, http::StatusCode, response::IntoResponse, routing::get, Router,
};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;
use photogate_core::build_gateway_router;
use photogate_core::gateway::middleware::cors_layer;

pub fn build_router(state: AppState) -> Router {
    let gateway_router = build_gateway_router(state.route().clone(), state.registry());
    let body_limit = state.config().max_body_bytes();
    let cors = cors_layer(&state.config().cors_origins);

    let admin_routes = Router::<AppState>::new()
        .nest("/api/gateway", api::router())
        .route("/metrics", get(api::get_metrics));

    let public_routes = Router::<AppState>::new()
        .route("/healthz", get(health_check))
        .route("/version", get(version_info));

    // `/health` itself belongs to the backend and is forwarded as a capability.
    admin_routes
        .merge(public_routes)
        .with_state(state)
        .merge(gateway_router)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({"status": "ok"})))
}

async fn version_info() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "version": option_env!("GIT_VERSION").unwrap_or("dev"),
            "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
            "cargo_version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
