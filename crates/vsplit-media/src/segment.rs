//! Segment planning, processing profiles, and output discovery.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Shortest segment the muxer is asked to cut, in seconds.
pub const MIN_SEGMENT_SECS: f64 = 0.1;

/// Extension of produced segment files.
pub const SEGMENT_EXTENSION: &str = "mp4";

/// Prefix of produced segment files.
const SEGMENT_PREFIX: &str = "part_";

/// Processing profile selected by the caller's mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplitProfile {
    /// Stream copy, I/O bound
    Fast,
    /// Re-encode with scaling and sharpening, CPU bound
    #[default]
    Heavy,
}

impl SplitProfile {
    /// Map a mode string to a profile. Unrecognised modes use the default.
    pub fn from_mode(mode: &str) -> Self {
        match mode {
            "fast" => SplitProfile::Fast,
            "heavy" => SplitProfile::Heavy,
            _ => SplitProfile::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitProfile::Fast => "fast",
            SplitProfile::Heavy => "heavy",
        }
    }

    /// Add the profile's encoding arguments to a command.
    pub fn apply(&self, cmd: FfmpegCommand) -> FfmpegCommand {
        match self {
            SplitProfile::Fast => cmd.codec_copy(),
            SplitProfile::Heavy => cmd
                .video_filter("scale=1280:-2,unsharp=5:5:1.0")
                .video_codec("libx264")
                .preset("slower")
                .crf(20)
                .audio_codec("aac")
                .audio_bitrate("128k"),
        }
    }
}

/// How a source is cut into parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitPlan {
    /// Probed source duration in seconds
    pub source_duration: f64,
    /// Requested number of parts (at least 1)
    pub parts: u32,
    /// Target duration of each segment in seconds
    pub segment_duration: f64,
}

impl SplitPlan {
    /// Plan `parts` segments over `source_duration` seconds.
    pub fn new(source_duration: f64, parts: u32) -> Self {
        let parts = parts.max(1);
        let segment_duration = (source_duration / f64::from(parts)).max(MIN_SEGMENT_SECS);
        Self {
            source_duration,
            parts,
            segment_duration,
        }
    }

    /// Zero-padded ordinal width. The muxer may emit a few more files than
    /// requested, so the width covers twice the requested count.
    pub fn ordinal_width(&self) -> usize {
        let max_ordinal = u64::from(self.parts) * 2;
        max_ordinal.to_string().len().max(2)
    }

    /// Muxer output pattern inside `dest_dir`, e.g. `part_%02d.mp4`.
    pub fn output_pattern(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(format!(
            "{}%0{}d.{}",
            SEGMENT_PREFIX,
            self.ordinal_width(),
            SEGMENT_EXTENSION
        ))
    }
}

fn is_segment_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(SEGMENT_EXTENSION))
        .unwrap_or(false)
}

/// List segment files in `dir`, sorted lexicographically by name.
///
/// A missing directory yields an empty list.
pub async fn list_segment_files(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_segment_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Remove segment files left in `dir` by an earlier run.
pub(crate) async fn clear_segment_files(dir: &Path) -> MediaResult<usize> {
    let stale = list_segment_files(dir).await?;
    for path in &stale {
        fs::remove_file(path).await?;
    }
    Ok(stale.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plan_divides_duration() {
        let plan = SplitPlan::new(40.0, 4);
        assert!((plan.segment_duration - 10.0).abs() < f64::EPSILON);
        assert_eq!(plan.parts, 4);
    }

    #[test]
    fn test_plan_clamps_parts_and_duration() {
        let plan = SplitPlan::new(30.0, 0);
        assert_eq!(plan.parts, 1);
        assert!((plan.segment_duration - 30.0).abs() < f64::EPSILON);

        let tiny = SplitPlan::new(0.5, 100);
        assert!((tiny.segment_duration - MIN_SEGMENT_SECS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_output_pattern_width() {
        let dir = Path::new("/data/v1/segments_fast");
        assert_eq!(
            SplitPlan::new(40.0, 4).output_pattern(dir),
            dir.join("part_%02d.mp4")
        );
        assert_eq!(
            SplitPlan::new(400.0, 80).output_pattern(dir),
            dir.join("part_%03d.mp4")
        );
    }

    #[test]
    fn test_profile_from_mode() {
        assert_eq!(SplitProfile::from_mode("fast"), SplitProfile::Fast);
        assert_eq!(SplitProfile::from_mode("heavy"), SplitProfile::Heavy);
        assert_eq!(SplitProfile::from_mode("turbo"), SplitProfile::Heavy);
        assert_eq!(SplitProfile::from_mode("FAST"), SplitProfile::Heavy);
    }

    #[test]
    fn test_profile_args() {
        let fast = SplitProfile::Fast
            .apply(FfmpegCommand::new("in.mp4", "out.mp4"))
            .build_args();
        assert!(fast.contains(&"copy".to_string()));
        assert!(!fast.contains(&"libx264".to_string()));

        let heavy = SplitProfile::Heavy
            .apply(FfmpegCommand::new("in.mp4", "out.mp4"))
            .build_args();
        assert!(heavy.contains(&"libx264".to_string()));
        assert!(heavy.contains(&"scale=1280:-2,unsharp=5:5:1.0".to_string()));
        assert!(heavy.contains(&"128k".to_string()));
    }

    #[tokio::test]
    async fn test_list_segment_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["part_02.mp4", "part_00.MP4", "part_01.mp4", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").await.unwrap();
        }
        fs::create_dir(dir.path().join("nested.mp4")).await.unwrap();

        let files = list_segment_files(dir.path()).await.unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["part_00.MP4", "part_01.mp4", "part_02.mp4"]);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = list_segment_files(&dir.path().join("missing")).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_clear_segment_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("part_00.mp4"), b"x").await.unwrap();
        fs::write(dir.path().join("keep.txt"), b"x").await.unwrap();

        assert_eq!(clear_segment_files(dir.path()).await.unwrap(), 1);
        assert!(!dir.path().join("part_00.mp4").exists());
        assert!(dir.path().join("keep.txt").exists());
    }
}
