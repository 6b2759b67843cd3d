//! Video upload, listing and source download handlers.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use validator::Validate;

use vsplit_models::{VideoId, VideoMeta};
use vsplit_storage::SOURCE_FILE;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::video_file_response;
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the video.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub video_id: VideoId,
    pub duration: f64,
    pub filename: Option<String>,
}

/// Store an uploaded video and probe its duration.
pub async fn upload_video(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        return store_upload(&state, &user, field).await.map(Json);
    }

    Err(ApiError::bad_request("Missing file field"))
}

async fn store_upload(
    state: &AppState,
    user: &AuthUser,
    mut field: Field<'_>,
) -> ApiResult<UploadResponse> {
    let video_id = VideoId::new();
    let filename = field.file_name().map(base_name).filter(|n| !n.is_empty());

    state.store.create_video_dir(&video_id).await?;

    match ingest(state, user, &video_id, &mut field, filename).await {
        Ok(response) => Ok(response),
        Err(e) => {
            // Leave nothing half-written behind
            if let Err(cleanup) = state.store.remove_video_dir(&video_id).await {
                warn!(video_id = %video_id, "Failed to clean up upload: {}", cleanup);
            }
            Err(e)
        }
    }
}

async fn ingest(
    state: &AppState,
    user: &AuthUser,
    video_id: &VideoId,
    field: &mut Field<'_>,
    filename: Option<String>,
) -> ApiResult<UploadResponse> {
    let source = state.store.source_path(video_id)?;
    let mut file = File::create(&source)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create source file: {}", e)))?;

    let mut bytes: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::bad_request(format!("Upload interrupted: {}", e)))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
        bytes += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
    drop(file);

    if bytes == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let duration = state.transcoder.probe_duration(&source).await?;

    let meta = VideoMeta::new(video_id.clone(), user.username.clone(), filename, duration);
    state.store.write_meta(&meta).await?;
    metrics::record_upload(bytes);

    info!(
        video_id = %video_id,
        owner = %user.username,
        bytes,
        duration,
        "Video uploaded"
    );

    Ok(UploadResponse {
        video_id: meta.video_id,
        duration: meta.duration,
        filename: meta.filename,
    })
}

/// Last path component of a client-supplied filename.
fn base_name(name: &str) -> String {
    name.rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    25
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListVideosQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: usize,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: usize,
}

#[derive(Debug, Serialize)]
pub struct VideoSummary {
    pub video_id: VideoId,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub filename: Option<String>,
}

impl From<VideoMeta> for VideoSummary {
    fn from(meta: VideoMeta) -> Self {
        Self {
            video_id: meta.video_id,
            duration: meta.duration,
            created_at: meta.created_at,
            filename: meta.filename,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub videos: Vec<VideoSummary>,
}

/// List the caller's videos (all videos for admins), newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListVideosQuery>,
) -> ApiResult<Json<VideoListResponse>> {
    query.validate()?;

    let visible: Vec<VideoMeta> = state
        .store
        .list_videos()
        .await?
        .into_iter()
        .filter(|meta| user.can_access(meta))
        .collect();

    let total = visible.len();
    let start = (query.page - 1).saturating_mul(query.page_size);
    let videos = visible
        .into_iter()
        .skip(start)
        .take(query.page_size)
        .map(VideoSummary::from)
        .collect();

    Ok(Json(VideoListResponse {
        total,
        page: query.page,
        page_size: query.page_size,
        videos,
    }))
}

#[derive(Debug, Serialize)]
pub struct VideoDetail {
    pub video_id: VideoId,
    pub filename: Option<String>,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
}

/// Get a video's metadata.
pub async fn get_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoDetail>> {
    let video_id = VideoId::from_string(video_id);
    let meta = user.authorize_video(&state, &video_id).await?;

    Ok(Json(VideoDetail {
        source_url: source_url(&video_id),
        video_id: meta.video_id,
        filename: meta.filename,
        duration: meta.duration,
        created_at: meta.created_at,
    }))
}

pub(crate) fn source_url(video_id: &VideoId) -> String {
    format!("/segments/{}/source/{}", video_id, SOURCE_FILE)
}

/// Stream the uploaded source of an already authorized video.
pub(crate) async fn source_response(state: &AppState, video_id: &VideoId) -> ApiResult<Response> {
    let path = state.store.source_path(video_id)?;
    video_file_response(&path, SOURCE_FILE, None).await
}
