//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or splitting a video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Could not determine video duration: {0}")]
    DurationUnavailable(String),

    #[error("{tool} failed: {message}")]
    InvocationFailed {
        tool: String,
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a duration failure error.
    pub fn duration_unavailable(message: impl Into<String>) -> Self {
        Self::DurationUnavailable(message.into())
    }

    /// Create an invocation failure error.
    pub fn invocation_failed(
        tool: impl Into<String>,
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::InvocationFailed {
            tool: tool.into(),
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// The executable is missing from the execution environment.
    pub fn tool_missing(tool: impl Into<String>) -> Self {
        let tool = tool.into();
        let message = format!("{} not found on PATH", tool);
        Self::invocation_failed(tool, message, None, None)
    }

    pub fn is_duration_unavailable(&self) -> bool {
        matches!(self, MediaError::DurationUnavailable(_))
    }

    pub fn is_invocation_failed(&self) -> bool {
        matches!(self, MediaError::InvocationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_missing_is_invocation_failure() {
        let err = MediaError::tool_missing("ffmpeg");
        assert!(err.is_invocation_failed());
        assert_eq!(err.to_string(), "ffmpeg failed: ffmpeg not found on PATH");
    }

    #[test]
    fn test_duration_message() {
        let err = MediaError::duration_unavailable("N/A");
        assert!(err.is_duration_unavailable());
        assert!(err.to_string().contains("N/A"));
    }
}
