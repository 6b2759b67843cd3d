//! Segment listing models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Segments produced for one processing mode of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentOutput {
    /// Processing mode the segments were produced with
    pub mode: String,
    /// Number of segment files
    pub parts: usize,
    /// Download paths, in playback order
    pub segments: Vec<String>,
}
