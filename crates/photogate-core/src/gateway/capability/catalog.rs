//! Built-in capability table for the photo-library backend.
//!
//! Reads that the UI renders on first paint carry demo payloads shaped like
//! the backend's answers so an empty gallery renders instead of an error.

use axum::http::Method;
use serde_json::{json, Value};
use std::time::Duration;

use super::{Capability, CapabilityRegistry, FallbackPayload, RegistryError};
use crate::gateway::inbound::InboundRequest;

/// Name of the only silo a demo deployment exposes.
pub const DEMO_SILO: &str = "demo";

/// Indexing and retraining can take minutes on a cold backend.
const SLOW_CALL_TIMEOUT: Duration = Duration::from_secs(120);

fn fixed(value: Value) -> FallbackPayload {
    FallbackPayload::Static(value)
}

fn search_echo(req: &InboundRequest) -> Value {
    json!({
        "query": req.query_param("q").unwrap_or_default(),
        "results": [],
        "total": 0,
        "offset": req.query_param("offset").and_then(|o| o.parse::<u64>().ok()).unwrap_or(0),
    })
}

fn idle_indexing() -> Value {
    json!({
        "progress": {
            "status": "idle",
            "processed": 0,
            "total": 0,
            "percentage": 0,
            "current_file": "",
            "faces_found": 0,
            "animals_found": 0,
        },
        "entities": {
            "faces": [{ "label": "faces", "count": 0 }],
            "animals": [{ "label": "animals", "count": 0 }],
        }
    })
}

fn demo_silo() -> Value {
    json!({
        "name": DEMO_SILO,
        "created_at": null,
        "has_password": false,
        "password_mode": null,
    })
}

fn reads() -> Vec<Capability> {
    vec![
        Capability::read("system.health", "/health"),
        Capability::read("system.health_extended", "/api/system/health-extended"),
        Capability::read("system.paths", "/api/system/paths"),
        Capability::read("system.has_indexed_files", "/api/status/has-indexed-files")
            .soft_fallback(fixed(json!({ "has_indexed_files": false, "file_count": 0 }))),
        // Media
        Capability::read("media.list", "/api/media").soft_fallback(fixed(json!([]))),
        Capability::read("media.by_date", "/api/media/by-date").soft_fallback(fixed(json!([]))),
        Capability::read("media.stats", "/api/media/stats").soft_fallback(fixed(json!({
            "total": 0,
            "by_type": {},
            "total_size": 0,
        }))),
        Capability::read("media.count", "/api/media/count/total")
            .soft_fallback(fixed(json!({ "total": 0, "processed": 0, "remaining": 0 }))),
        Capability::read("media.filter_options", "/api/media/filter-options").soft_fallback(fixed(
            json!({ "file_types": [], "date_range": null, "size_range": null, "people": [] }),
        )),
        Capability::read("media.metadata", "/api/media/:id/metadata"),
        Capability::read("media.faces", "/api/media/:id/faces"),
        Capability::read("media.clusters", "/api/media/:id/clusters"),
        Capability::read("media.favorite_status", "/api/media/:id/favorite"),
        Capability::read("media.folders", "/api/media/:id/folders"),
        Capability::read("media.audio", "/api/media/audio"),
        Capability::read("media.file", "/api/media/file/:id").binary(),
        Capability::read("media.thumbnail", "/api/media/thumbnail/:id").binary(),
        Capability::read("media.face_crop", "/api/media/face-crop/:id").binary(),
        // Search
        Capability::read("search.query", "/api/search")
            .with_timeout(SLOW_CALL_TIMEOUT)
            .soft_fallback(FallbackPayload::Computed(search_echo)),
        Capability::read("search.advanced", "/api/media/search")
            .with_timeout(SLOW_CALL_TIMEOUT)
            .soft_fallback(fixed(json!([]))),
        Capability::read("search.file_types", "/api/search/file-types")
            .soft_fallback(fixed(json!({ "categories": {} }))),
        // Indexing
        Capability::read("indexing.status", "/api/indexing").soft_fallback(fixed(idle_indexing())),
        Capability::read("indexing.pause_status", "/api/indexing/pause-status")
            .soft_fallback(fixed(json!({ "paused": false }))),
        // People and faces
        Capability::read("people.list", "/api/people").soft_fallback(fixed(json!([]))),
        Capability::read("people.photos", "/api/people/:id/photos"),
        Capability::read("faces.clusters", "/api/faces/clusters").soft_fallback(fixed(json!([]))),
        Capability::read("faces.cluster", "/api/faces/:id"),
        Capability::read("faces.recluster_status", "/api/faces/recluster/status"),
        Capability::read("animals.list", "/api/animals").soft_fallback(fixed(json!([]))),
        Capability::read("labels.faces", "/api/labels/face").soft_fallback(fixed(json!([]))),
        Capability::read("labels.face", "/api/labels/face/:id"),
        Capability::read("labels.animals", "/api/labels/animal").soft_fallback(fixed(json!([]))),
        // Review and retraining
        Capability::read("detections.uncertain", "/api/uncertain-detections"),
        Capability::read("detections.uncertain_count", "/api/uncertain-detections/count")
            .soft_fallback(fixed(json!({ "total": 0, "by_type": {} }))),
        Capability::read("retraining.status", "/api/retraining/status"),
        Capability::read("retraining.progress", "/api/retraining/progress"),
        Capability::read("retraining.quality_metrics", "/api/retraining/quality-metrics"),
        Capability::read("retraining.faces_for_training", "/api/retraining/faces-for-training"),
        // Silos
        Capability::read("silos.list", "/api/silos/list").soft_fallback(fixed(json!([{
            "name": DEMO_SILO,
            "created_at": null,
            "has_password": false,
            "password_mode": null,
            "is_active": true,
        }]))),
        Capability::read("silos.active", "/api/silos/active").soft_fallback(fixed(demo_silo())),
        Capability::read("silos.media_paths", "/api/silos/:name/media-paths"),
        // Folders and favorites
        Capability::read("folders.list", "/api/folders").soft_fallback(fixed(json!([]))),
        Capability::read("folders.get", "/api/folders/:id"),
        Capability::read("folders.contents", "/api/folders/:id/contents"),
        Capability::read("folders.health", "/api/folders/:id/health"),
        Capability::read("favorites.list", "/api/favorites")
            .soft_fallback(fixed(json!({ "favorites": [], "count": 0 }))),
        // User configuration
        Capability::read("config.get", "/api/config").with_fallback(fixed(json!({
            "sort_by": "date_taken",
            "sort_order": "desc",
            "items_per_page": 100,
            "auto_tag_confidence": 0.8,
            "require_review_below": 0.5,
        }))),
    ]
}

fn mutations() -> Vec<Capability> {
    let post = |name: &str, path: &str| Capability::mutation(name, Method::POST, path);
    vec![
        // Indexing control
        post("indexing.start", "/api/indexing").require_fields(&["path"]),
        post("indexing.pause", "/api/indexing/pause"),
        post("indexing.resume", "/api/indexing/resume"),
        post("indexing.reindex_all", "/api/indexing/reindex-all"),
        post("indexing.check_new_files", "/api/indexing/check-new-files"),
        post("indexing.count_files", "/api/indexing/count-files"),
        post("indexing.detect_faces_only", "/api/indexing/detect-faces-only"),
        post("indexing.index_and_detect_faces", "/api/indexing/index-and-detect-faces"),
        post("indexing.detect_faces_batch", "/api/detect-faces-batch"),
        post("index.rebuild", "/api/index/rebuild").with_timeout(SLOW_CALL_TIMEOUT),
        // Media
        post("media.upload", "/api/media/upload"),
        post("media.hide", "/api/media/hide"),
        post("media.move", "/api/media/:id/move"),
        post("media.rotate", "/api/media/:id/rotate"),
        post("media.toggle_favorite", "/api/media/:id/favorite"),
        post("media.bookmark", "/api/media/:id/bookmark"),
        post("media.keywords", "/api/media/:id/keywords"),
        post("media.face_match", "/api/media/:id/face-match"),
        post("favorites.batch", "/api/favorites/batch"),
        Capability::mutation("media.delete", Method::DELETE, "/api/media/:id"),
        // People and faces
        post("people.name", "/api/people/:id/name").require_fields(&["name"]),
        post("people.hide", "/api/people/:id/hide").require_fields(&["hidden"]),
        post("people.confirm", "/api/people/:id/confirm"),
        post("people.reject", "/api/people/:id/reject"),
        post("faces.name", "/api/faces/:id/name"),
        post("faces.hide", "/api/faces/:id/hide"),
        post("faces.add", "/api/faces/:id/add"),
        post("faces.confirm", "/api/faces/:id/confirm"),
        post("faces.remove", "/api/faces/:id/remove"),
        post("faces.rotate", "/api/faces/:id/rotate"),
        post("faces.move_photo", "/api/faces/:id/move-photo"),
        post("faces.profile_pic", "/api/faces/:id/profile-pic"),
        post("faces.merge", "/api/faces/merge"),
        post("faces.merge_clusters", "/api/faces/merge-clusters"),
        post("faces.create_cluster", "/api/faces/create-cluster"),
        post("faces.add_to_multiple_clusters", "/api/faces/add-to-multiple-clusters"),
        post("faces.check_duplicate_name", "/api/faces/check-duplicate-name"),
        post("faces.recluster", "/api/faces/recluster"),
        post("cache.clear_face_clusters", "/api/cache/clear-face-clusters"),
        post("cache.rebuild_people_clusters", "/api/cache/rebuild-people-clusters"),
        post("animals.name", "/api/animals/:id/name").require_fields(&["name"]),
        post("animals.hide", "/api/animals/:id/hide").require_fields(&["hidden"]),
        post("labels.set_face", "/api/labels/face/:id"),
        post("labels.set_animal", "/api/labels/animal/:id"),
        // Review and retraining
        post("detections.review", "/api/uncertain-detections/:id/review"),
        post("detections.batch_review", "/api/uncertain-detections/batch-review"),
        post("retraining.full", "/api/retraining/full").with_timeout(SLOW_CALL_TIMEOUT),
        post("retraining.embeddings", "/api/retrain-embeddings").with_timeout(SLOW_CALL_TIMEOUT),
        post("search.approve", "/api/search/:q/approve"),
        post("search.reject", "/api/search/:q/reject"),
        // Silos
        post("silos.create", "/api/silos/create").require_fields(&["name"]),
        post("silos.switch", "/api/silos/switch").require_fields(&["name"]),
        post("silos.rename", "/api/silos/rename").require_fields(&["old_name", "new_name"]),
        post("silos.update_password", "/api/silos/update-password").require_fields(&["silo_name"]),
        post("silos.save_current", "/api/silos/save-current"),
        post("silos.set_media_paths", "/api/silos/:name/media-paths"),
        post("silos.nuke", "/api/silos/nuke"),
        post("silos.upload", "/api/silos/upload"),
        post("silos.download", "/api/silos/download").binary(),
        Capability::mutation("silos.delete", Method::DELETE, "/api/silos/:name"),
        // Folders
        post("folders.create", "/api/folders").require_fields(&["name"]),
        Capability::mutation("folders.update", Method::PUT, "/api/folders/:id"),
        Capability::mutation("folders.delete", Method::DELETE, "/api/folders/:id"),
        post("folders.add_media", "/api/folders/:id/add-media").require_fields(&["mediaIds"]),
        post("folders.remove_media", "/api/folders/:id/remove-media")
            .require_fields(&["mediaIds"]),
        post("folders.zip", "/api/folders/:id/zip").binary(),
        post("folders.download_zip", "/api/folders/download-zip").binary(),
        // Configuration
        post("config.update", "/api/config"),
        post("system.resolve_directory", "/api/system/resolve-directory")
            .require_fields(&["folderName"]),
    ]
}

fn telemetry() -> Vec<Capability> {
    vec![
        Capability::telemetry(
            "search.feedback",
            Method::POST,
            "/api/search/feedback",
            json!({ "success": true }),
        )
        .require_query(&["media_id", "query", "feedback"]),
        Capability::telemetry(
            "media.view",
            Method::POST,
            "/api/media/:id/view",
            json!({ "success": true }),
        ),
    ]
}

/// Registry mirroring the backend's public API.
pub fn default_registry() -> Result<CapabilityRegistry, RegistryError> {
    let mut registry = CapabilityRegistry::new();
    for capability in reads().into_iter().chain(mutations()).chain(telemetry()) {
        registry.register(capability)?;
    }
    Ok(registry)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::capability::{CapabilityKind, FailurePolicy, ResponseKind};
    use axum::http::HeaderMap;
    use bytes::Bytes;

    #[test]
    fn test_default_registry_is_consistent() {
        let registry = default_registry().unwrap();
        assert!(registry.len() > 100);

        for cap in registry.iter() {
            if cap.policy == FailurePolicy::SoftFallback {
                assert_eq!(cap.kind, CapabilityKind::Read, "{}", cap.name);
            }
            if cap.kind == CapabilityKind::Mutation {
                assert!(cap.fallback.is_none(), "{}", cap.name);
            }
        }
    }

    #[test]
    fn test_backend_write_routes_are_mutations() {
        let registry = default_registry().unwrap();
        let writes = [
            "/api/silos/update-password",
            "/api/silos/nuke",
            "/api/silos/save-current",
            "/api/silos/upload",
            "/api/silos/download",
            "/api/silos/:name/media-paths",
            "/api/index/rebuild",
            "/api/animals/:id/name",
            "/api/animals/:id/hide",
            "/api/labels/face/:id",
            "/api/labels/animal/:id",
            "/api/faces/:id/add",
            "/api/faces/:id/confirm",
            "/api/faces/:id/remove",
            "/api/faces/:id/rotate",
            "/api/faces/:id/move-photo",
            "/api/faces/:id/profile-pic",
            "/api/faces/create-cluster",
            "/api/faces/merge-clusters",
            "/api/faces/add-to-multiple-clusters",
            "/api/faces/check-duplicate-name",
            "/api/people/:id/confirm",
            "/api/people/:id/reject",
            "/api/folders/download-zip",
            "/api/folders/:id/zip",
            "/api/media/:id/bookmark",
            "/api/media/:id/keywords",
            "/api/media/:id/face-match",
            "/api/indexing/count-files",
            "/api/indexing/detect-faces-only",
            "/api/indexing/index-and-detect-faces",
            "/api/uncertain-detections/:id/review",
            "/api/uncertain-detections/batch-review",
            "/api/retraining/full",
            "/api/search/:q/approve",
            "/api/search/:q/reject",
        ];
        for path in writes {
            let cap = registry
                .get(&Method::POST, path)
                .unwrap_or_else(|| panic!("POST {path} not registered"));
            assert_eq!(cap.kind, CapabilityKind::Mutation, "{path}");
            assert!(!cap.idempotent, "{path}");
            assert!(cap.fallback.is_none(), "{path}");
        }

        let reads = [
            "/api/animals",
            "/api/labels/face",
            "/api/labels/face/:id",
            "/api/labels/animal",
            "/api/folders/:id/health",
            "/api/media/:id/folders",
            "/api/media/audio",
            "/api/uncertain-detections",
            "/api/uncertain-detections/count",
            "/api/retraining/status",
            "/api/retraining/progress",
            "/api/retraining/quality-metrics",
            "/api/retraining/faces-for-training",
            "/api/system/paths",
        ];
        for path in reads {
            let cap = registry
                .get(&Method::GET, path)
                .unwrap_or_else(|| panic!("GET {path} not registered"));
            assert_eq!(cap.kind, CapabilityKind::Read, "{path}");
        }

        for path in ["/api/folders/download-zip", "/api/folders/:id/zip", "/api/silos/download"] {
            assert_eq!(registry.get(&Method::POST, path).unwrap().response, ResponseKind::Binary);
        }
    }

    #[test]
    fn test_mutations_are_not_retried() {
        let registry = default_registry().unwrap();
        let create = registry.by_name("silos.create").unwrap();
        assert!(!create.idempotent);
        // PUT and DELETE stay idempotent by method.
        assert!(registry.by_name("folders.update").unwrap().idempotent);
    }

    #[test]
    fn test_binary_capabilities() {
        let registry = default_registry().unwrap();
        let thumb = registry.get(&Method::GET, "/api/media/thumbnail/:id").unwrap();
        assert_eq!(thumb.response, ResponseKind::Binary);
        assert!(thumb.fallback.is_none());
    }

    #[test]
    fn test_search_fallback_echoes_query() {
        let registry = default_registry().unwrap();
        let search = registry.by_name("search.query").unwrap();
        let req = InboundRequest::new(
            Method::GET,
            &"/api/search?q=beach&offset=50".parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
        );
        let body = search.fallback.as_ref().unwrap().render(&req);
        assert_eq!(body["query"], "beach");
        assert_eq!(body["offset"], 50);
        assert_eq!(body["results"], json!([]));
    }
}
