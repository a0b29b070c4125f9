use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::routing::{get, MethodFilter, MethodRouter};
use axum::{Json, Router};
use photogate_types::models::{Mode, ModeDecision};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use super::capability::{Capability, CapabilityRegistry};
use super::inbound::InboundRequest;
use super::route::GatewayRoute;

fn method_filter(method: &Method) -> Option<MethodFilter> {
    match *method {
        Method::GET => Some(MethodFilter::GET),
        Method::POST => Some(MethodFilter::POST),
        Method::PUT => Some(MethodFilter::PUT),
        Method::DELETE => Some(MethodFilter::DELETE),
        Method::PATCH => Some(MethodFilter::PATCH),
        Method::HEAD => Some(MethodFilter::HEAD),
        Method::OPTIONS => Some(MethodFilter::OPTIONS),
        Method::TRACE => Some(MethodFilter::TRACE),
        _ => None,
    }
}

/// Body of `GET /api/system/mode`, same keys the backend answers with.
pub fn system_mode_body(decision: &ModeDecision) -> Value {
    json!({
        "demo_mode": decision.mode == Mode::Demo,
        "read_only": decision.read_only,
        "mode": decision.mode,
        "message": decision.message(),
    })
}

async fn handle_system_mode(State(route): State<GatewayRoute>) -> Json<Value> {
    Json(system_mode_body(&route.current_mode()))
}

fn capability_route(route: &GatewayRoute, capabilities: &[Arc<Capability>]) -> MethodRouter {
    let mut method_router = MethodRouter::new();
    for capability in capabilities {
        let Some(filter) = method_filter(&capability.method) else {
            warn!("Skipping {}: unsupported method {}", capability.name, capability.method);
            continue;
        };
        let route = route.clone();
        let capability = Arc::clone(capability);
        method_router = method_router.on(
            filter,
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| async move {
                route.handle(&capability, InboundRequest::new(method, &uri, headers, body)).await
            },
        );
    }
    method_router
}

/// One route per registered path; methods on the same path share a
/// `MethodRouter`. `GET /api/system/mode` is answered locally.
pub fn build_gateway_router(route: GatewayRoute, registry: &CapabilityRegistry) -> Router {
    let mut by_path: BTreeMap<&str, Vec<Arc<Capability>>> = BTreeMap::new();
    for capability in registry.iter() {
        by_path.entry(capability.path.as_str()).or_default().push(Arc::clone(capability));
    }

    let mut router = Router::new();
    for (path, capabilities) in &by_path {
        router = router.route(path, capability_route(&route, capabilities));
    }

    router.route("/api/system/mode", get(handle_system_mode).with_state(route))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_method_filters() {
        assert!(method_filter(&Method::GET).is_some());
        assert!(method_filter(&Method::DELETE).is_some());
        assert!(method_filter(&Method::CONNECT).is_none());
    }

    #[test]
    fn test_system_mode_body() {
        let demo = system_mode_body(&ModeDecision::demo());
        assert_eq!(demo["demo_mode"], true);
        assert_eq!(demo["read_only"], true);
        assert_eq!(demo["message"], "Demo mode - read only");

        let live = system_mode_body(&ModeDecision::live(Url::parse("http://127.0.0.1:8000").unwrap()));
        assert_eq!(live["demo_mode"], false);
        assert_eq!(live["mode"], "live");
    }
}
