//! Inbound request capture and validation.

use axum::http::{header, HeaderMap, HeaderValue, Method, Uri};
use bytes::Bytes;
use photogate_types::GatewayError;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::capability::Capability;
use super::client::RequestBody;

/// Everything the gateway needs from the caller's request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub raw_query: Option<String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let raw_query = uri.query().filter(|q| !q.is_empty()).map(str::to_string);
        let query = raw_query
            .as_deref()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { method, path: uri.path().to_string(), raw_query, query, headers, body }
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    fn content_type(&self) -> Option<&HeaderValue> {
        self.headers.get(header::CONTENT_TYPE)
    }

    fn declares_json(&self) -> bool {
        self.content_type()
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                let mime = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
                mime == "application/json" || mime.ends_with("+json")
            })
            .unwrap_or(false)
    }

    /// JSON bodies are parsed so they can be re-serialized; anything else is
    /// passed through as raw bytes with its content type.
    pub fn canonical_body(&self) -> Result<Option<RequestBody>, GatewayError> {
        if self.body.is_empty() {
            return Ok(None);
        }

        if self.declares_json() {
            return serde_json::from_slice::<Value>(&self.body)
                .map(|v| Some(RequestBody::Json(v)))
                .map_err(|e| GatewayError::InvalidInput {
                    message: "Request body is not valid JSON".to_string(),
                    details: Some(json!({ "error": e.to_string() })),
                });
        }

        match self.content_type() {
            Some(ct) => Ok(Some(RequestBody::Raw {
                bytes: self.body.clone(),
                content_type: Some(ct.clone()),
            })),
            None => Ok(Some(match serde_json::from_slice::<Value>(&self.body) {
                Ok(v) => RequestBody::Json(v),
                Err(_) => RequestBody::Raw { bytes: self.body.clone(), content_type: None },
            })),
        }
    }

    /// Check declared required inputs and canonicalize the body.
    /// Runs before any network call.
    pub fn validate(&self, capability: &Capability) -> Result<Option<RequestBody>, GatewayError> {
        let missing_query: Vec<&str> = capability
            .required_query
            .iter()
            .copied()
            .filter(|name| self.query_param(name).map_or(true, |v| v.trim().is_empty()))
            .collect();
        if !missing_query.is_empty() {
            return Err(missing("query parameter", &missing_query));
        }

        let body = self.canonical_body()?;
        if capability.required_fields.is_empty() {
            return Ok(body);
        }

        let object = match &body {
            Some(RequestBody::Json(Value::Object(map))) => map,
            _ => return Err(missing("field", &capability.required_fields)),
        };
        let missing_fields: Vec<&str> = capability
            .required_fields
            .iter()
            .copied()
            .filter(|name| object.get(*name).map_or(true, Value::is_null))
            .collect();
        if !missing_fields.is_empty() {
            return Err(missing("field", &missing_fields));
        }

        Ok(body)
    }
}

fn missing(what: &str, names: &[&str]) -> GatewayError {
    GatewayError::InvalidInput {
        message: format!("Missing required {}(s): {}", what, names.join(", ")),
        details: Some(json!({ "missing": names })),
    }
}
