//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use vsplit_jobs::JobError;
use vsplit_media::MediaError;
use vsplit_storage::StorageError;

use crate::config::is_production_env;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Media(#[from] MediaError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(e) => match e {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
                StorageError::Io(_) | StorageError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Media(e) => match e {
                MediaError::DurationUnavailable(_) => StatusCode::BAD_REQUEST,
                MediaError::FileNotFound(_) => StatusCode::NOT_FOUND,
                MediaError::InvocationFailed { .. } | MediaError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Message for the `detail` field.
    fn detail(&self) -> String {
        match self {
            ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::BadRequest(m)
            | ApiError::Conflict(m)
            | ApiError::Validation(m) => m.clone(),
            ApiError::Storage(StorageError::NotFound(_)) => "Not found".to_string(),
            ApiError::Storage(StorageError::InvalidKey(key)) => format!("Invalid path component '{}'", key),
            ApiError::Media(MediaError::FileNotFound(_)) => "Video not found".to_string(),
            _ => self.to_string(),
        }
    }

    /// Detail sent to the client. Server errors are masked in production.
    fn public_detail(&self, production: bool) -> String {
        if production && self.status_code().is_server_error() {
            "An internal error occurred".to_string()
        } else {
            self.detail()
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::Conflict { id, status } => {
                ApiError::conflict(format!("A split for {} is already {}", id, status))
            }
            JobError::TaskFailed(msg) => ApiError::internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::Validation(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let production = std::env::var("ENVIRONMENT")
            .map(|v| is_production_env(&v))
            .unwrap_or(false);
        let detail = self.public_detail(production);

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsplit_models::{JobId, JobStatus};

    #[test]
    fn test_media_status_codes() {
        assert_eq!(
            ApiError::from(MediaError::duration_unavailable("N/A")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(MediaError::tool_missing("ffmpeg")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_status_codes() {
        assert_eq!(
            ApiError::from(StorageError::not_found("v1")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StorageError::invalid_key("..")).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_job_conflict() {
        let err = ApiError::from(JobError::conflict(JobId::from("v1"), JobStatus::Processing));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.detail(), "A split for v1 is already processing");
    }

    #[test]
    fn test_server_detail_masked_in_production() {
        let err = ApiError::from(MediaError::tool_missing("ffmpeg"));
        assert_eq!(err.public_detail(true), "An internal error occurred");
        assert!(err.public_detail(false).contains("ffmpeg"));

        let missing = ApiError::not_found("Video not found");
        assert_eq!(missing.public_detail(true), "Video not found");
    }

    #[test]
    fn test_client_errors_keep_plain_detail() {
        assert_eq!(ApiError::not_found("Video not found").detail(), "Video not found");
        assert_eq!(ApiError::forbidden("Forbidden").detail(), "Forbidden");
    }
}
