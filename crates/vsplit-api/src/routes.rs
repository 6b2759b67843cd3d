//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::handlers::auth::login;
use crate::handlers::jobs::get_job;
use crate::handlers::segments::{get_segment, list_segments};
use crate::handlers::split::{split_async, split_sync};
use crate::handlers::videos::{get_video, list_videos, upload_video};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let video_routes = Router::new()
        .route("/videos", get(list_videos))
        .route("/videos/upload", post(upload_video))
        .route("/videos/:video_id", get(get_video))
        .route("/videos/:video_id/split", post(split_sync))
        .route("/videos/:video_id/split_async", post(split_async))
        .route("/videos/:video_id/segments", get(list_segments))
        .route("/jobs/:video_id", get(get_job))
        // Also serves the source at /segments/:video_id/source/input.mp4
        .route("/segments/:video_id/:mode/:filename", get(get_segment));

    let auth_routes = Router::new().route("/auth/login", post(login));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let mut router = Router::new()
        .merge(video_routes)
        .merge(auth_routes)
        .merge(health_routes)
        .merge(metrics_routes);

    if state.config.static_dir.is_dir() {
        info!("Serving static files from {}", state.config.static_dir.display());
        router = router.nest_service("/web", ServeDir::new(&state.config.static_dir));
    }

    router
        // Multipart uploads are bounded by the outer limit instead
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
