//! Segment listing and download handlers.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use vsplit_models::{SegmentOutput, VideoId};
use vsplit_storage::{validate_key, StorageError, SOURCE_FILE};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::split::validate_mode;
use crate::handlers::video_file_response;
use crate::handlers::videos::source_response;
use crate::state::AppState;

/// Path segment under which the uploaded source is served.
const SOURCE_SEGMENT: &str = "source";

#[derive(Debug, Deserialize)]
pub struct ListSegmentsQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SegmentsResponse {
    pub video_id: VideoId,
    pub outputs: Vec<SegmentOutput>,
}

/// List produced segments, for one mode or for all of them.
pub async fn list_segments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    Query(query): Query<ListSegmentsQuery>,
) -> ApiResult<Json<SegmentsResponse>> {
    let mode = query.mode.filter(|m| !m.is_empty());
    if let Some(mode) = &mode {
        validate_mode(mode).map_err(|_| ApiError::Validation(format!("Invalid mode '{}'", mode)))?;
    }

    let video_id = VideoId::from_string(video_id);
    user.authorize_video(&state, &video_id).await?;

    let outputs = state.store.list_outputs(&video_id, mode.as_deref()).await?;
    Ok(Json(SegmentsResponse { video_id, outputs }))
}

/// Download a segment file, or the uploaded source via
/// `/segments/{id}/source/input.mp4`.
pub async fn get_segment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((video_id, mode, filename)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    validate_key(&mode)?;
    validate_key(&filename)?;

    let video_id = VideoId::from_string(video_id);
    user.authorize_video(&state, &video_id).await?;

    if mode == SOURCE_SEGMENT && filename == SOURCE_FILE {
        return source_response(&state, &video_id).await;
    }

    let path = match state.store.segment_path(&video_id, &mode, &filename).await {
        Ok(path) => path,
        Err(StorageError::NotFound(_)) => return Err(ApiError::not_found("Not found")),
        Err(e) => return Err(e.into()),
    };

    video_file_response(&path, &filename, Some("public, max-age=3600")).await
}
