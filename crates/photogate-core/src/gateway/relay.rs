//! Turning backend answers and gateway failures into caller responses.

use axum::body::Body;
use axum::http::response::Builder;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use photogate_types::GatewayError;
use serde_json::{json, Value};
use std::time::Duration;

use super::client::{BackendResponse, NetworkError};

/// Content headers carried over on relayed responses.
const RELAYED_HEADERS: &[header::HeaderName] = &[
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::CONTENT_DISPOSITION,
    header::ACCEPT_RANGES,
    header::CONTENT_RANGE,
];

/// Longest plain-text backend error kept in a message.
const MAX_TEXT_MESSAGE: usize = 512;

fn status_of(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}

/// Render a gateway failure as its envelope with the matching status.
pub fn error_response(err: &GatewayError) -> Response {
    let envelope = err.to_envelope();
    (status_of(envelope.http_status), Json(envelope)).into_response()
}

/// 200 with a JSON payload produced by the gateway itself.
pub fn json_payload(value: Value) -> Response {
    (StatusCode::OK, Json(value)).into_response()
}

/// Buffered bodies get a fresh `content-length` from axum.
fn copy_headers(backend: &BackendResponse, mut builder: Builder, skip_length: bool) -> Builder {
    for name in RELAYED_HEADERS {
        if skip_length && name == header::CONTENT_LENGTH {
            continue;
        }
        for value in backend.headers().get_all(name) {
            builder = builder.header(name, value.clone());
        }
    }
    builder
}

/// Buffer a JSON (or any small) body and relay it with the backend's status.
pub async fn relay_buffered(
    backend: BackendResponse,
    timeout: Duration,
) -> Result<Response, NetworkError> {
    let status = backend.status();
    let builder = copy_headers(&backend, Response::builder().status(status.as_u16()), true);
    let body = backend.bytes_within(timeout).await?;
    Ok(finish(builder, Body::from(body)))
}

/// Stream a binary body through, keeping content headers.
pub fn relay_streaming(backend: BackendResponse) -> Response {
    let status = backend.status();
    let builder = copy_headers(&backend, Response::builder().status(status.as_u16()), false);
    finish(builder, Body::from_stream(backend.into_stream()))
}

fn finish(builder: Builder, body: Body) -> Response {
    match builder.body(body) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to assemble relayed response: {}", e);
            StatusCode::BAD_GATEWAY.into_response()
        },
    }
}

/// Map a non-success backend answer to `BackendRejected`, surfacing the
/// backend's `detail` / `message` / `error` field.
pub fn rejected(status: u16, body: &Bytes) -> GatewayError {
    let parsed = serde_json::from_slice::<Value>(body).ok();
    let field = parsed.as_ref().and_then(|v| {
        ["detail", "message", "error"].iter().find_map(|key| v.get(*key).filter(|f| !f.is_null()))
    });

    let message = match field {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            if text.is_empty() || parsed.is_some() {
                status_of(status).canonical_reason().unwrap_or("Backend error").to_string()
            } else {
                text.chars().take(MAX_TEXT_MESSAGE).collect()
            }
        },
    };

    GatewayError::BackendRejected {
        status,
        message,
        details: field.map(|f| json!({ "detail": f })),
    }
}
