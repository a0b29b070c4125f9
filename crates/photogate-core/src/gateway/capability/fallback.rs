//! Fallback payloads and on-disk overrides.

use photogate_types::ConfigError;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use super::CapabilityRegistry;
use crate::gateway::inbound::InboundRequest;

/// Data served instead of a live backend answer.
#[derive(Clone)]
pub enum FallbackPayload {
    Static(Value),
    /// Built from the inbound request, e.g. echoing the search query
    Computed(fn(&InboundRequest) -> Value),
}

impl FallbackPayload {
    pub fn render(&self, request: &InboundRequest) -> Value {
        match self {
            Self::Static(value) => value.clone(),
            Self::Computed(build) => build(request),
        }
    }
}

impl fmt::Debug for FallbackPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Load `<capability-name>.json` files from `dir` into the registry.
///
/// Unreadable or malformed files and names with no matching capability are
/// skipped with a warning. Returns the number of overrides applied.
pub fn load_fallback_overrides(
    registry: &mut CapabilityRegistry,
    dir: &Path,
) -> Result<usize, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::from_io_error(dir, &e))?;

    let mut applied = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let value = match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()))
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Skipping fallback override {}: {}", path.display(), e);
                continue;
            },
        };

        if registry.set_fallback(name, FallbackPayload::Static(value)) {
            applied += 1;
        } else {
            warn!("Fallback override {} matches no read capability", path.display());
        }
    }

    info!("Loaded {} fallback override(s) from {}", applied, dir.display());
    Ok(applied)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::capability::Capability;
    use axum::http::{HeaderMap, Method};
    use bytes::Bytes;
    use serde_json::json;

    fn request(uri: &str) -> InboundRequest {
        InboundRequest::new(Method::GET, &uri.parse().unwrap(), HeaderMap::new(), Bytes::new())
    }

    #[test]
    fn test_computed_payload_sees_request() {
        fn echo(req: &InboundRequest) -> Value {
            json!({ "query": req.query_param("q").unwrap_or_default() })
        }
        let payload = FallbackPayload::Computed(echo);
        assert_eq!(payload.render(&request("/api/search?q=dogs"))["query"], "dogs");
    }

    #[test]
    fn test_overrides_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("people.list.json"), r#"[{"id": 1, "name": "Ada"}]"#)
            .unwrap();
        std::fs::write(dir.path().join("folders.create.json"), "{}").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut registry = CapabilityRegistry::new();
        registry.register(Capability::read("people.list", "/api/people")).unwrap();
        registry
            .register(Capability::mutation("folders.create", Method::POST, "/api/folders"))
            .unwrap();

        let applied = load_fallback_overrides(&mut registry, dir.path()).unwrap();
        assert_eq!(applied, 1);

        let people = registry.by_name("people.list").unwrap();
        let body = people.fallback.as_ref().unwrap().render(&request("/api/people"));
        assert_eq!(body[0]["name"], "Ada");
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let mut registry = CapabilityRegistry::new();
        let err = load_fallback_overrides(&mut registry, Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. } | ConfigError::ReadError { .. }));
    }
}
