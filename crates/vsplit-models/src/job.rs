//! Split job records.
//!
//! A job is keyed by the identifier of the video it splits, so a video has at
//! most one live record. Records are immutable values: every lifecycle
//! transition produces a new record that replaces the previous one.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::VideoId;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&VideoId> for JobId {
    fn from(id: &VideoId) -> Self {
        Self(id.as_str().to_string())
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stored job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, background task not started yet
    Queued,
    /// Transcoder is running
    Processing,
    /// Segments produced
    Done,
    /// Split failed
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Position along `queued -> processing -> {done, error}`.
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Done | JobStatus::Error => 2,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One in-flight or completed split request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Job ID (same as the video ID)
    pub id: JobId,
    /// Current state
    pub status: JobStatus,
    /// Requested processing mode, as given by the caller
    pub mode: String,
    /// Number of produced segments (done only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<usize>,
    /// Failure description (error only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the request was accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queued_at: Option<DateTime<Utc>>,
    /// When the background task started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a freshly accepted job.
    pub fn queued(id: JobId, mode: impl Into<String>) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            mode: mode.into(),
            parts: None,
            error: None,
            queued_at: Some(Utc::now()),
            started_at: None,
            finished_at: None,
        }
    }

    /// Transition to `processing`.
    pub fn into_processing(self) -> Self {
        Self {
            status: JobStatus::Processing,
            started_at: Some(Utc::now()),
            ..self
        }
    }

    /// Transition to `done` with the number of produced segments.
    pub fn into_done(self, parts: usize) -> Self {
        let finished_at = self.finish_time();
        Self {
            status: JobStatus::Done,
            parts: Some(parts),
            error: None,
            finished_at: Some(finished_at),
            ..self
        }
    }

    /// Transition to `error`. An empty message is replaced so the record
    /// always carries a description.
    pub fn into_error(self, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "split failed".to_string();
        }
        let finished_at = self.finish_time();
        Self {
            status: JobStatus::Error,
            parts: None,
            error: Some(message),
            finished_at: Some(finished_at),
            ..self
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether a run for this record is still pending or executing.
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }

    // Wall clock may step backwards; finished_at must never precede started_at.
    fn finish_time(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.started_at {
            Some(started) if started > now => started,
            _ => now,
        }
    }
}

/// Marker serialized as `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStatus {
    Unknown,
}

/// Answer of a status query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobSnapshot {
    /// The stored record, exactly as written
    Known(JobRecord),
    /// No record exists for the identifier
    Unknown { status: UnknownStatus },
}

impl JobSnapshot {
    pub fn unknown() -> Self {
        JobSnapshot::Unknown {
            status: UnknownStatus::Unknown,
        }
    }

    /// Status string as reported to callers.
    pub fn status_str(&self) -> &'static str {
        match self {
            JobSnapshot::Known(record) => record.status.as_str(),
            JobSnapshot::Unknown { .. } => "unknown",
        }
    }

    pub fn record(&self) -> Option<&JobRecord> {
        match self {
            JobSnapshot::Known(record) => Some(record),
            JobSnapshot::Unknown { .. } => None,
        }
    }
}

impl From<Option<JobRecord>> for JobSnapshot {
    fn from(record: Option<JobRecord>) -> Self {
        match record {
            Some(record) => JobSnapshot::Known(record),
            None => JobSnapshot::unknown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lifecycle_keeps_timestamps() {
        let queued = JobRecord::queued(JobId::from("v1"), "fast");
        assert_eq!(queued.status, JobStatus::Queued);
        assert!(queued.queued_at.is_some());
        assert!(queued.started_at.is_none());

        let processing = queued.clone().into_processing();
        assert_eq!(processing.queued_at, queued.queued_at);
        assert!(processing.started_at.is_some());

        let done = processing.clone().into_done(4);
        assert_eq!(done.status, JobStatus::Done);
        assert_eq!(done.parts, Some(4));
        assert_eq!(done.started_at, processing.started_at);
        assert!(done.finished_at.unwrap() >= done.started_at.unwrap());
    }

    #[test]
    fn test_error_record_has_message() {
        let record = JobRecord::queued(JobId::from("v2"), "heavy")
            .into_processing()
            .into_error("");
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(record.error.as_deref(), Some("split failed"));
        assert!(record.parts.is_none());
        assert!(record.finished_at.unwrap() >= record.started_at.unwrap());
    }

    #[test]
    fn test_status_order() {
        assert!(JobStatus::Queued.rank() < JobStatus::Processing.rank());
        assert!(JobStatus::Processing.rank() < JobStatus::Done.rank());
        assert_eq!(JobStatus::Done.rank(), JobStatus::Error.rank());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_unknown_snapshot_serialization() {
        let value = serde_json::to_value(JobSnapshot::unknown()).unwrap();
        assert_eq!(value, json!({ "status": "unknown" }));
    }

    #[test]
    fn test_known_snapshot_is_the_record() {
        let record = JobRecord::queued(JobId::from("v1"), "fast")
            .into_processing()
            .into_done(4);
        let value = serde_json::to_value(JobSnapshot::Known(record.clone())).unwrap();
        assert_eq!(value, serde_json::to_value(&record).unwrap());
        assert_eq!(value["status"], "done");
        assert_eq!(value["mode"], "fast");
        assert_eq!(value["parts"], 4);
        assert!(value.get("error").is_none());
    }
}
