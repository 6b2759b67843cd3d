//! Job error types.

use thiserror::Error;
use vsplit_models::{JobId, JobStatus};

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job {id} is already {status}")]
    Conflict { id: JobId, status: JobStatus },

    #[error("Job task failed: {0}")]
    TaskFailed(String),
}

impl JobError {
    pub fn conflict(id: JobId, status: JobStatus) -> Self {
        Self::Conflict { id, status }
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, JobError::Conflict { .. })
    }
}
