//! Prometheus metrics for gateway observability.
//!
//! Exposes metrics compatible with Prometheus/OpenMetrics format:
//! - `photogate_requests_total{capability,outcome,status}` - Counter of gateway requests
//! - `photogate_request_duration_seconds{capability,outcome}` - Histogram of request durations
//! - `photogate_backend_attempts_total{capability}` - Counter of backend attempts (incl. retries)
//! - `photogate_fallbacks_served_total{capability,reason}` - Counter of fallback payloads served
//! - `photogate_backend_ready` - Gauge, 1 when the last readiness probe succeeded
//! - `photogate_uptime_seconds` - Gauge of gateway uptime

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Global Prometheus handle for rendering metrics
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global start time for uptime calculation
static METRICS_START_TIME: OnceLock<Instant> = OnceLock::new();

/// Buckets spanning fallback answers (sub-millisecond) through cold-backend
/// searches (tens of seconds).
const GATEWAY_LATENCY_BUCKETS: &[f64] = &[
    0.005, // fallback served locally
    0.025, 0.1, // warm reads
    0.25, 0.5, 1.0, // thumbnails, listings
    2.5, 5.0, 10.0, // search on a warm model
    30.0, 60.0, 120.0, // model loading, long indexing calls
];

/// Install the Prometheus recorder. Call once at startup before any metric
/// is recorded; later calls return the existing handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let _ = METRICS_START_TIME.get_or_init(Instant::now);

    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(GATEWAY_LATENCY_BUCKETS)?
        .install_recorder()?;

    describe_counter!("photogate_requests_total", "Total number of gateway requests processed");
    describe_histogram!("photogate_request_duration_seconds", "Gateway request duration in seconds");
    describe_counter!(
        "photogate_backend_attempts_total",
        "Backend attempts made on behalf of gateway requests, retries included"
    );
    describe_counter!(
        "photogate_fallbacks_served_total",
        "Fallback payloads served instead of a live backend answer"
    );
    describe_gauge!("photogate_backend_ready", "1 when the last readiness probe succeeded");
    describe_gauge!("photogate_uptime_seconds", "Gateway uptime in seconds");

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
/// Returns None if metrics have not been initialized.
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Record a completed gateway request.
pub fn record_request(capability: &str, outcome: &str, status: u16, duration: Duration) {
    let labels = [
        ("capability", capability.to_string()),
        ("outcome", outcome.to_string()),
        ("status", status_category(status).to_string()),
    ];
    counter!("photogate_requests_total", &labels).increment(1);

    let timing = [("capability", capability.to_string()), ("outcome", outcome.to_string())];
    histogram!("photogate_request_duration_seconds", &timing).record(duration.as_secs_f64());
}

pub fn record_backend_attempts(capability: &str, attempts: u32) {
    if attempts > 0 {
        let labels = [("capability", capability.to_string())];
        counter!("photogate_backend_attempts_total", &labels).increment(u64::from(attempts));
    }
}

pub fn record_fallback(capability: &str, reason: &str) {
    let labels = [("capability", capability.to_string()), ("reason", reason.to_string())];
    counter!("photogate_fallbacks_served_total", &labels).increment(1);
}

pub fn set_backend_ready(ready: bool) {
    gauge!("photogate_backend_ready").set(if ready { 1.0 } else { 0.0 });
}

/// Update uptime gauge.
/// Called on every metrics render.
pub fn update_uptime_gauge() {
    if let Some(start) = METRICS_START_TIME.get() {
        gauge!("photogate_uptime_seconds").set(start.elapsed().as_secs_f64());
    }
}

/// Render all metrics in Prometheus text format.
pub fn render_metrics() -> String {
    update_uptime_gauge();

    if let Some(handle) = get_prometheus_handle() {
        handle.render()
    } else {
        String::from("# Metrics not initialized\n")
    }
}

/// Convert HTTP status code to category for metrics labels.
pub fn status_category(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
