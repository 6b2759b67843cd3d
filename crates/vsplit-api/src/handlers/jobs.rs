//! Job status handler.

use axum::extract::{Path, State};
use axum::Json;

use vsplit_models::{JobId, JobSnapshot, VideoId};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Current state of the split job for a video, or `{"status": "unknown"}`.
pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    let video_id = VideoId::from_string(video_id);
    user.authorize_video(&state, &video_id).await?;

    Ok(Json(state.registry.query(&JobId::from(&video_id)).await))
}
