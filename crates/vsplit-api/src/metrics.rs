//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vsplit_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vsplit_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vsplit_http_requests_in_flight";

    // Uploads and synchronous splits
    pub const UPLOADS_TOTAL: &str = "vsplit_uploads_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "vsplit_upload_bytes_total";
    pub const SYNC_SPLIT_DURATION_SECONDS: &str = "vsplit_sync_split_duration_seconds";
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

/// Record a stored upload.
pub fn record_upload(bytes: u64) {
    counter!(names::UPLOADS_TOTAL).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}

/// Record a synchronous split.
pub fn record_sync_split(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    histogram!(names::SYNC_SPLIT_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Replace identifiers in a path so labels stay low-cardinality.
fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let normalized: Vec<&str> = match segments.as_slice() {
        ["videos", "upload"] => vec!["videos", "upload"],
        ["videos", _, rest @ ..] => {
            let mut out = vec!["videos", ":video_id"];
            out.extend(rest.iter().copied());
            out
        }
        ["jobs", _] => vec!["jobs", ":video_id"],
        ["segments", _, "source", _] => vec!["segments", ":video_id", "source", ":file"],
        ["segments", _, _, _] => vec!["segments", ":video_id", ":mode", ":file"],
        ["web", ..] => vec!["web", "*"],
        other => other.to_vec(),
    };
    format!("/{}", normalized.join("/"))
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
