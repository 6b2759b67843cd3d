//! HTTP handlers.

pub mod auth;
pub mod health;
pub mod jobs;
pub mod segments;
pub mod split;
pub mod videos;

pub use health::{health, ready};

use std::path::Path;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};

/// Stream a stored video file.
pub(crate) async fn video_file_response(
    path: &Path,
    filename: &str,
    cache_control: Option<&str>,
) -> ApiResult<Response> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("Not found"));
        }
        Err(e) => return Err(ApiError::internal(e.to_string())),
    };
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .len();

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header("Cross-Origin-Resource-Policy", "cross-origin");

    if let Some(cache_control) = cache_control {
        builder = builder.header(header::CACHE_CONTROL, cache_control);
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
