//! The transcoder seam used by the split endpoints and the job runner.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info};

use crate::command::{check_tool, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;
use crate::segment::{clear_segment_files, list_segment_files, SplitPlan, SplitProfile};

/// Probes and segments source videos.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Source duration in seconds.
    async fn probe_duration(&self, source: &Path) -> MediaResult<f64>;

    /// Cut `source` into segments inside `dest_dir` following `plan`.
    ///
    /// Returns the produced files sorted by name, which is their playback order.
    async fn split(
        &self,
        source: &Path,
        dest_dir: &Path,
        plan: &SplitPlan,
        mode: &str,
    ) -> MediaResult<Vec<PathBuf>>;
}

/// Transcoder backed by the ffmpeg and ffprobe executables.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Check that both executables resolve.
    pub fn check_available(&self) -> MediaResult<()> {
        check_tool(&self.ffmpeg)?;
        check_tool(&self.ffprobe)?;
        Ok(())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe_duration(&self, source: &Path) -> MediaResult<f64> {
        probe_duration(&self.ffprobe, source).await
    }

    async fn split(
        &self,
        source: &Path,
        dest_dir: &Path,
        plan: &SplitPlan,
        mode: &str,
    ) -> MediaResult<Vec<PathBuf>> {
        let profile = SplitProfile::from_mode(mode);

        fs::create_dir_all(dest_dir).await?;
        let cleared = clear_segment_files(dest_dir).await?;
        if cleared > 0 {
            debug!("Removed {} stale segments from {}", cleared, dest_dir.display());
        }

        let cmd = FfmpegCommand::new(source, plan.output_pattern(dest_dir))
            .segment(plan.segment_duration);
        let cmd = profile.apply(cmd);

        FfmpegRunner::new(self.ffmpeg.clone()).run(&cmd).await?;

        list_segment_files(dest_dir).await
    }
}

/// Result of a completed split.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub plan: SplitPlan,
    pub files: Vec<PathBuf>,
}

impl SplitOutcome {
    pub fn parts(&self) -> usize {
        self.files.len()
    }
}

/// Probe `source`, plan `parts` segments, and produce them in `dest_dir`.
pub async fn split_into_parts(
    transcoder: &dyn Transcoder,
    source: &Path,
    dest_dir: &Path,
    parts: u32,
    mode: &str,
) -> MediaResult<SplitOutcome> {
    if !source.exists() {
        return Err(MediaError::FileNotFound(source.to_path_buf()));
    }

    let duration = transcoder.probe_duration(source).await?;
    let plan = SplitPlan::new(duration, parts);

    info!(
        "Splitting {} into {} parts of {:.3}s (mode: {})",
        source.display(),
        plan.parts,
        plan.segment_duration,
        mode
    );

    let start = Instant::now();
    let files = transcoder.split(source, dest_dir, &plan, mode).await?;

    info!(
        "Split {} produced {} segments in {:.1}s",
        source.display(),
        files.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(SplitOutcome { plan, files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes one empty file per planned part.
    struct FakeTranscoder {
        duration: f64,
        plans: Mutex<Vec<SplitPlan>>,
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn probe_duration(&self, _source: &Path) -> MediaResult<f64> {
            Ok(self.duration)
        }

        async fn split(
            &self,
            _source: &Path,
            dest_dir: &Path,
            plan: &SplitPlan,
            _mode: &str,
        ) -> MediaResult<Vec<PathBuf>> {
            self.plans.lock().unwrap().push(*plan);
            fs::create_dir_all(dest_dir).await?;
            for i in 0..plan.parts {
                fs::write(dest_dir.join(format!("part_{:02}.mp4", i)), b"").await?;
            }
            list_segment_files(dest_dir).await
        }
    }

    #[tokio::test]
    async fn test_split_into_parts_plans_segment_duration() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("input.mp4");
        fs::write(&source, b"video").await.unwrap();

        let fake = FakeTranscoder {
            duration: 40.0,
            plans: Mutex::new(Vec::new()),
        };
        let dest = dir.path().join("segments_fast");
        let outcome = split_into_parts(&fake, &source, &dest, 4, "fast").await.unwrap();

        assert_eq!(outcome.parts(), 4);
        assert!((outcome.plan.segment_duration - 10.0).abs() < f64::EPSILON);
        assert_eq!(fake.plans.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_split_into_parts_missing_source() {
        let dir = TempDir::new().unwrap();
        let fake = FakeTranscoder {
            duration: 40.0,
            plans: Mutex::new(Vec::new()),
        };
        let err = split_into_parts(&fake, &dir.path().join("nope.mp4"), dir.path(), 4, "fast")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
        assert!(fake.plans.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ffmpeg_transcoder_missing_tools() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("input.mp4");
        fs::write(&source, b"video").await.unwrap();

        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        assert!(transcoder.check_available().is_err());

        let err = split_into_parts(&transcoder, &source, dir.path(), 4, "fast")
            .await
            .unwrap_err();
        assert!(err.is_invocation_failed());
    }
}
