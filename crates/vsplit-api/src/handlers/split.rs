//! Split handlers.

use std::path::PathBuf;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError};

use vsplit_jobs::SplitRequest;
use vsplit_media::split_into_parts;
use vsplit_models::{JobId, JobStatus, VideoId};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

fn default_parts() -> u32 {
    10
}

fn default_mode() -> String {
    "heavy".to_string()
}

/// A mode names an output directory, so only a safe alphabet is accepted.
pub(crate) fn validate_mode(mode: &str) -> Result<(), ValidationError> {
    let valid = !mode.is_empty()
        && mode.len() <= 32
        && mode
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("mode");
        err.message = Some("mode must be 1-32 characters of [A-Za-z0-9_-]".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SplitQuery {
    #[serde(default = "default_parts")]
    #[validate(range(max = 1000, message = "parts must be at most 1000"))]
    pub parts: u32,
    #[serde(default = "default_mode")]
    #[validate(custom(function = "validate_mode"))]
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct SplitResponse {
    pub video_id: VideoId,
    pub mode: String,
    pub parts: usize,
    pub segments: Vec<String>,
}

/// Split a video and wait for the result.
pub async fn split_sync(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    Query(query): Query<SplitQuery>,
) -> ApiResult<Json<SplitResponse>> {
    query.validate()?;
    let video_id = VideoId::from_string(video_id);
    user.authorize_video(&state, &video_id).await?;

    let source = existing_source(&state, &video_id).await?;
    let dest_dir = state.store.segments_dir(&video_id, &query.mode)?;

    let start = Instant::now();
    let outcome = split_into_parts(
        state.transcoder.as_ref(),
        &source,
        &dest_dir,
        query.parts,
        &query.mode,
    )
    .await?;
    metrics::record_sync_split(&query.mode, start.elapsed().as_secs_f64());

    let segments: Vec<String> = outcome
        .files
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| {
            format!(
                "/segments/{}/{}/{}",
                video_id,
                query.mode,
                name.to_string_lossy()
            )
        })
        .collect();

    info!(
        video_id = %video_id,
        mode = %query.mode,
        parts = segments.len(),
        "Synchronous split finished"
    );

    Ok(Json(SplitResponse {
        video_id,
        mode: query.mode,
        parts: segments.len(),
        segments,
    }))
}

#[derive(Debug, Serialize)]
pub struct SplitAsyncResponse {
    pub job: JobId,
    pub status: JobStatus,
}

/// Queue a background split and return immediately.
pub async fn split_async(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    Query(query): Query<SplitQuery>,
) -> ApiResult<Json<SplitAsyncResponse>> {
    query.validate()?;
    let video_id = VideoId::from_string(video_id);
    user.authorize_video(&state, &video_id).await?;

    let source = existing_source(&state, &video_id).await?;
    let dest_dir = state.store.segments_dir(&video_id, &query.mode)?;

    let handle = state
        .runner
        .submit(SplitRequest {
            id: JobId::from(&video_id),
            source,
            dest_dir,
            parts: query.parts,
            mode: query.mode,
        })
        .await?;

    let queued = handle.detach();
    Ok(Json(SplitAsyncResponse {
        job: queued.id,
        status: queued.status,
    }))
}

async fn existing_source(state: &AppState, video_id: &VideoId) -> ApiResult<PathBuf> {
    let source = state.store.source_path(video_id)?;
    match tokio::fs::metadata(&source).await {
        Ok(meta) if meta.is_file() => Ok(source),
        _ => Err(ApiError::not_found("Video not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_mode() {
        assert!(validate_mode("fast").is_ok());
        assert!(validate_mode("heavy").is_ok());
        assert!(validate_mode("my-mode_2").is_ok());
        assert!(validate_mode("").is_err());
        assert!(validate_mode("../x").is_err());
        assert!(validate_mode("a b").is_err());
        assert!(validate_mode(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_split_query_validation() {
        let ok = SplitQuery {
            parts: 4,
            mode: "fast".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_mode = SplitQuery {
            parts: 4,
            mode: "fa/st".into(),
        };
        assert!(bad_mode.validate().is_err());

        let too_many = SplitQuery {
            parts: 5000,
            mode: "fast".into(),
        };
        assert!(too_many.validate().is_err());
    }
}
