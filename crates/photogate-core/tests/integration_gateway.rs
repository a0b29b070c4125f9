#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "panics are the assertion mechanism in integration tests")]

use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use photogate_core::gateway::capability::{Capability, CapabilityRegistry, FallbackPayload};
use photogate_core::gateway::readiness::{ProbeOutcome, ReadinessTracker};
use photogate_core::{build_gateway_router, default_registry, GatewayRoute, ModeResolver};
use photogate_core::RetryingRequestClient;
use photogate_types::models::{DeploymentSignals, HostingPlatform, RetryConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    signals: DeploymentSignals,
    backend: Url,
    retry: RetryConfig,
    registry: CapabilityRegistry,
    readiness: Arc<ReadinessTracker>,
}

impl Harness {
    fn live(backend: &str) -> Self {
        Self {
            signals: DeploymentSignals::default(),
            backend: Url::parse(backend).expect("backend URL"),
            retry: RetryConfig { max_retries: 1, base_delay_ms: 10 },
            registry: default_registry().expect("default registry"),
            readiness: ReadinessTracker::new(),
        }
    }

    fn demo(backend: &str) -> Self {
        let mut harness = Self::live(backend);
        harness.signals.force_demo = true;
        harness
    }

    fn server(self) -> TestServer {
        let route = GatewayRoute::new(
            RetryingRequestClient::new(reqwest::Client::new()),
            ModeResolver::new(self.signals, self.backend),
            self.readiness,
            self.retry,
            Duration::from_secs(5),
        );
        TestServer::new(build_gateway_router(route, &self.registry)).expect("test server")
    }
}

/// A loopback address nothing listens on.
fn closed_backend() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn test_demo_mutation_is_disabled_without_network() {
    let backend = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&backend).await;

    let server = Harness::demo(&backend.uri()).server();
    let resp = server.post("/api/silos/create").json(&json!({"name": "family"})).await;

    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);
    let body: Value = resp.json();
    assert_eq!(body["category"], "capability_disabled");
    assert_eq!(body["http_status"], 403);
    assert!(body["message"].as_str().expect("message").contains("demo mode"));
}

#[tokio::test]
async fn test_demo_read_serves_fallback_without_network() {
    let backend = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&backend).await;

    let server = Harness::demo(&backend.uri()).server();

    let silos = server.get("/api/silos/list").await;
    assert_eq!(silos.status_code(), StatusCode::OK);
    let body: Value = silos.json();
    assert_eq!(body[0]["name"], "demo");

    let search = server.get("/api/search").add_query_param("q", "sunset").await;
    assert_eq!(search.status_code(), StatusCode::OK);
    assert_eq!(search.json::<Value>()["query"], "sunset");

    // No demo payload for raw media files.
    let file = server.get("/api/media/file/12").await;
    assert_eq!(file.status_code(), StatusCode::FORBIDDEN);

    // Telemetry still reports success.
    let feedback = server
        .post("/api/search/feedback")
        .add_query_param("media_id", "3")
        .add_query_param("query", "cat")
        .add_query_param("feedback", "confirmed")
        .await;
    assert_eq!(feedback.status_code(), StatusCode::OK);
    assert_eq!(feedback.json::<Value>()["success"], true);
}

#[tokio::test]
async fn test_system_mode_answered_locally() {
    let backend = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&backend).await;

    let demo = Harness::demo(&backend.uri()).server();
    let body: Value = demo.get("/api/system/mode").await.json();
    assert_eq!(body, json!({
        "demo_mode": true,
        "read_only": true,
        "mode": "demo",
        "message": "Demo mode - read only",
    }));

    let live = Harness::live(&backend.uri()).server();
    let body: Value = live.get("/api/system/mode").await.json();
    assert_eq!(body["demo_mode"], false);
    assert_eq!(body["read_only"], false);
}

#[tokio::test]
async fn test_live_unreachable_backend_serves_soft_fallback() {
    let server = Harness::live(&closed_backend()).server();

    let resp = server.get("/api/media").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<Value>(), json!([]));

    // Hard-fail reads surface the outage.
    let resp = server.get("/api/media/5/metadata").await;
    assert_eq!(resp.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json();
    assert_eq!(body["category"], "backend_unavailable");
    assert_eq!(body["details"]["attempts"], 2);
}

#[tokio::test]
async fn test_post_timeout_maps_to_backend_unavailable() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/index/rebuild"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&backend)
        .await;

    let mut harness = Harness::live(&backend.uri());
    harness.retry = RetryConfig { max_retries: 3, base_delay_ms: 10 };
    harness.registry = CapabilityRegistry::new();
    harness
        .registry
        .register(
            Capability::mutation("index.rebuild", Method::POST, "/api/index/rebuild")
                .with_timeout(Duration::from_millis(200)),
        )
        .expect("register");

    let resp = harness.server().post("/api/index/rebuild").await;
    assert_eq!(resp.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json();
    assert_eq!(body["category"], "backend_unavailable");
    assert_eq!(body["details"]["cause"], "timeout");
    assert_eq!(body["details"]["attempts"], 1);
}

#[tokio::test]
async fn test_json_relayed_unchanged() {
    let backend = MockServer::start().await;
    let listing = json!([{"id": 1, "path": "/photos/a.jpg", "type": ".jpg"}]);
    Mock::given(method("GET"))
        .and(path("/api/media"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
        .expect(1)
        .mount(&backend)
        .await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server.get("/api/media").add_query_param("limit", "10").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<Value>(), listing);
}

#[tokio::test]
async fn test_binary_relayed_with_content_type() {
    let backend = MockServer::start().await;
    let jpeg: Vec<u8> = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    Mock::given(method("GET"))
        .and(path("/api/media/thumbnail/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(jpeg.clone(), "image/jpeg")
                .insert_header("cache-control", "max-age=3600"),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server.get("/api/media/thumbnail/42").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.header("content-type"), "image/jpeg");
    assert_eq!(resp.header("cache-control"), "max-age=3600");
    assert_eq!(resp.as_bytes().to_vec(), jpeg);
}

#[tokio::test]
async fn test_backend_rejection_relays_status_and_detail() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/silos/switch"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Wrong password"})))
        .expect(1)
        .mount(&backend)
        .await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server.post("/api/silos/switch").json(&json!({"name": "private"})).await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["category"], "backend_rejected");
    assert_eq!(body["message"], "Wrong password");
    assert_eq!(body["details"]["detail"], "Wrong password");
}

#[tokio::test]
async fn test_invalid_input_rejected_before_network() {
    let backend = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&backend).await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server.post("/api/folders").json(&json!({"description": "no name"})).await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["category"], "invalid_input");
    assert_eq!(body["details"]["missing"], json!(["name"]));
}

#[tokio::test]
async fn test_telemetry_swallows_backend_failure() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/media/9/view"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&backend)
        .await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server.post("/api/media/9/view").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<Value>(), json!({"success": true}));
}

#[tokio::test]
async fn test_soft_fallback_does_not_hide_backend_errors() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/people"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db locked"})))
        .expect(2)
        .mount(&backend)
        .await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server.get("/api/people").await;
    assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json::<Value>()["category"], "backend_rejected");
}

#[tokio::test]
async fn test_remote_hosted_forwards_reads_and_blocks_mutations() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"favorites": [4], "count": 1})))
        .expect(1)
        .mount(&remote)
        .await;

    let mut harness = Harness::live(&closed_backend());
    harness.signals = DeploymentSignals {
        force_demo: false,
        hosting: HostingPlatform::Serverless { provider: "vercel".to_string() },
        remote_backend_url: Some(Url::parse(&remote.uri()).expect("remote URL")),
    };
    let server = harness.server();

    let resp = server.get("/api/favorites").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<Value>()["count"], 1);

    let resp = server.post("/api/media/4/favorite").await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);
    assert!(resp.json::<Value>()["message"]
        .as_str()
        .expect("message")
        .contains("read-only deployment"));
}

#[tokio::test]
async fn test_serverless_with_ready_local_backend_is_live() {
    let local = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/indexing/pause"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"paused": true})))
        .expect(1)
        .mount(&local)
        .await;

    let mut harness = Harness::live(&local.uri());
    harness.signals.hosting = HostingPlatform::Serverless { provider: "netlify".to_string() };
    harness.readiness.record(ProbeOutcome { healthy: true, latency: Duration::from_millis(3) });

    let resp = harness.server().post("/api/indexing/pause").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<Value>()["paused"], true);
}

#[tokio::test]
async fn test_custom_registry_fallback_override() {
    let mut harness = Harness::live(&closed_backend());
    harness.registry = CapabilityRegistry::new();
    harness
        .registry
        .register(
            Capability::read("albums.list", "/api/albums")
                .soft_fallback(FallbackPayload::Static(json!({"albums": []}))),
        )
        .expect("register");

    let resp = harness.server().get("/api/albums").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<Value>(), json!({"albums": []}));
}

#[tokio::test]
async fn test_json_body_forwarded_canonically() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/silos/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "family"})))
        .expect(1)
        .mount(&backend)
        .await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server
        .post("/api/silos/create")
        .bytes(bytes::Bytes::from_static(b"{ \"name\" :   \"family\" }"))
        .content_type("application/json")
        .add_header(
            axum::http::HeaderName::from_static("x-silo-name"),
            axum::http::HeaderValue::from_static("default"),
        )
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);

    let received = backend.received_requests().await.expect("request recording enabled");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body, br#"{"name":"family"}"#.to_vec());
    assert_eq!(
        received[0].headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(
        received[0].headers.get("x-silo-name").and_then(|v| v.to_str().ok()),
        Some("default")
    );
}

#[tokio::test]
async fn test_malformed_json_rejected_before_network() {
    let backend = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&backend).await;

    let server = Harness::live(&backend.uri()).server();
    let resp = server
        .post("/api/config")
        .bytes(bytes::Bytes::from_static(b"{\"sort_by\": "))
        .content_type("application/json")
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["category"], "invalid_input");
}
