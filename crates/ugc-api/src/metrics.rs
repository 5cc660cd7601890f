//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "ugc_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "ugc_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "ugc_http_requests_in_flight";

    // Generation pipeline metrics
    pub const GENERATIONS_STARTED_TOTAL: &str = "ugc_generations_started_total";
    pub const GENERATIONS_COMPLETED_TOTAL: &str = "ugc_generations_completed_total";
    pub const GENERATIONS_FAILED_TOTAL: &str = "ugc_generations_failed_total";

    // Asset transfer metrics
    pub const DOWNLOAD_DURATION_SECONDS: &str = "ugc_download_duration_seconds";
    pub const UPLOAD_DURATION_SECONDS: &str = "ugc_upload_duration_seconds";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "ugc_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a generation request accepted into the pipeline.
pub fn record_generation_started() {
    counter!(names::GENERATIONS_STARTED_TOTAL).increment(1);
}

/// Record a generation that reached `completed`.
pub fn record_generation_completed() {
    counter!(names::GENERATIONS_COMPLETED_TOTAL).increment(1);
}

/// Record a generation that ended `failed`, labeled by failure kind.
pub fn record_generation_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::GENERATIONS_FAILED_TOTAL, &labels).increment(1);
}

/// Record download duration.
pub fn record_download_duration(duration_secs: f64) {
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record upload duration.
pub fn record_upload_duration(duration_secs: f64) {
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    let path = regex_lite::Regex::new(
        r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
    )
    .unwrap()
    .replace_all(path, ":id");
    let path = regex_lite::Regex::new(r"/video/[a-zA-Z0-9_-]+")
        .unwrap()
        .replace_all(&path, "/video/:video_id");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/video/550e8400-e29b-41d4-a716-446655440000"),
            "/api/video/:id"
        );
        assert_eq!(sanitize_path("/api/video/abc123"), "/api/video/:video_id");
        assert_eq!(sanitize_path("/api/videos"), "/api/videos");
    }
}
