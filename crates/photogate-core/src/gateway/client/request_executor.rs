use reqwest::{header, Client, Response};

use super::{NetworkError, RequestBody, RequestSpec};

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Copy inbound headers that make sense to the backend.
///
/// `host`, `content-length` and `content-type` are dropped: reqwest derives them
/// from the target URL and the canonicalized body. `accept-encoding` is dropped so
/// relayed bodies arrive uncompressed.
pub fn forwardable_headers(inbound: &header::HeaderMap) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    for (name, value) in inbound {
        let lower = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&lower)
            || name == header::HOST
            || name == header::CONTENT_LENGTH
            || name == header::CONTENT_TYPE
            || name == header::ACCEPT_ENCODING
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// One attempt, bounded by `spec.timeout`. Dropping the returned future
/// abandons the in-flight call.
pub async fn execute_once(client: &Client, spec: &RequestSpec) -> Result<Response, NetworkError> {
    let mut builder =
        client.request(spec.method.clone(), spec.target.clone()).headers(spec.headers.clone());

    match &spec.body {
        Some(RequestBody::Json(value)) => {
            builder = builder.json(value);
        },
        Some(RequestBody::Raw { bytes, content_type }) => {
            if let Some(ct) = content_type {
                builder = builder.header(header::CONTENT_TYPE, ct.clone());
            }
            builder = builder.body(bytes.clone());
        },
        None => {},
    }

    match tokio::time::timeout(spec.timeout, builder.send()).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(NetworkError::from_reqwest(&e)),
        Err(_elapsed) => Err(NetworkError::timeout(spec.timeout)),
    }
}
