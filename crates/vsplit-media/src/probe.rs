//! FFprobe duration probing.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::{check_tool, spawn_error, stderr_tail};
use crate::error::{MediaError, MediaResult};

/// Probe the container duration of a media file, in seconds.
pub async fn probe_duration(ffprobe: &Path, path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let binary = check_tool(ffprobe)?;

    let output = Command::new(&binary)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| spawn_error(ffprobe, e))?;

    if !output.status.success() {
        return Err(MediaError::duration_unavailable(format!(
            "ffprobe exited with {}: {}",
            output.status,
            stderr_tail(&output.stderr)
        )));
    }

    let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))?;
    debug!("Probed {}: {:.3}s", path.display(), duration);
    Ok(duration)
}

/// Parse the bare `format=duration` value printed by ffprobe.
pub fn parse_duration(stdout: &str) -> MediaResult<f64> {
    let value = stdout.trim();
    let duration: f64 = value
        .parse()
        .map_err(|_| MediaError::duration_unavailable(format!("unexpected ffprobe output '{}'", value)))?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(MediaError::duration_unavailable(format!(
            "invalid duration {}",
            value
        )));
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert!((parse_duration("40.000000\n").unwrap() - 40.0).abs() < f64::EPSILON);
        assert!((parse_duration("  12.5 ").unwrap() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("N/A").unwrap_err().is_duration_unavailable());
        assert!(parse_duration("").unwrap_err().is_duration_unavailable());
        assert!(parse_duration("inf").unwrap_err().is_duration_unavailable());
        assert!(parse_duration("-3").unwrap_err().is_duration_unavailable());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let err = probe_duration(Path::new("ffprobe"), "/nonexistent/input.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
