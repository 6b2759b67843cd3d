//! Video metadata models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Metadata stored alongside every uploaded video (`meta.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMeta {
    /// Video ID
    pub video_id: VideoId,
    /// Username of the uploader
    pub owner: String,
    /// Original upload filename
    #[serde(default)]
    pub filename: Option<String>,
    /// Source duration in seconds
    pub duration: f64,
    /// Upload timestamp
    pub created_at: DateTime<Utc>,
}

impl VideoMeta {
    /// Create metadata for a freshly uploaded video.
    pub fn new(
        video_id: VideoId,
        owner: impl Into<String>,
        filename: Option<String>,
        duration: f64,
    ) -> Self {
        Self {
            video_id,
            owner: owner.into(),
            filename,
            duration,
            created_at: Utc::now(),
        }
    }

    /// Whether `username` uploaded this video.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner == username
    }
}
