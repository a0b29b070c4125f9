// CORS middleware
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Dev-server and preview origins of the photo UI.
const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// CORS layer for browser clients. `extra_origins` come from configuration;
/// unparsable entries are dropped.
pub fn cors_layer(extra_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = DEFAULT_ORIGINS
        .iter()
        .copied()
        .chain(extra_origins.iter().map(String::as_str))
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers(Any)
        .allow_credentials(false)
        .max_age(std::time::Duration::from_secs(3600))
}
