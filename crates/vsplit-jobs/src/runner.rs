//! Background split execution.

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::Instrument;

use vsplit_media::{split_into_parts, Transcoder};
use vsplit_models::{JobId, JobRecord};

use crate::error::{JobError, JobResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::registry::JobRegistry;

/// Everything a background split needs, owned by the task.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub id: JobId,
    pub source: PathBuf,
    pub dest_dir: PathBuf,
    pub parts: u32,
    pub mode: String,
}

/// A submitted job.
#[derive(Debug)]
pub struct JobHandle {
    /// The record written at submission
    pub queued: JobRecord,
    task: JoinHandle<JobRecord>,
}

impl JobHandle {
    pub fn id(&self) -> &JobId {
        &self.queued.id
    }

    /// Wait for the background task and return the terminal record it wrote.
    pub async fn wait(self) -> JobResult<JobRecord> {
        self.task
            .await
            .map_err(|e| JobError::task_failed(e.to_string()))
    }

    /// Let the task run on without tracking it.
    pub fn detach(self) -> JobRecord {
        self.queued
    }
}

/// Spawns split jobs and records their progress in the registry.
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    transcoder: Arc<dyn Transcoder>,
    guard_inflight: bool,
}

impl JobRunner {
    pub fn new(registry: Arc<JobRegistry>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            registry,
            transcoder,
            guard_inflight: false,
        }
    }

    /// Reject submissions for an ID whose previous job is still queued or
    /// processing. Off by default: a resubmission replaces the record.
    pub fn with_inflight_guard(mut self, enabled: bool) -> Self {
        self.guard_inflight = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Record the job as queued and start it in the background.
    ///
    /// Returns as soon as the queued record is stored.
    pub async fn submit(&self, request: SplitRequest) -> JobResult<JobHandle> {
        let queued = JobRecord::queued(request.id.clone(), request.mode.clone());

        if let Err(existing) = self
            .registry
            .claim(queued.clone(), self.guard_inflight)
            .await
        {
            metrics::record_job_rejected(&request.mode);
            return Err(JobError::conflict(existing.id, existing.status));
        }

        let logger = JobLogger::new(&request.id, "split");
        logger.log_queued(&request.mode, request.parts);
        metrics::record_job_submitted(&request.mode);

        let span = logger.create_span();
        let task = tokio::spawn(
            run_split(
                Arc::clone(&self.registry),
                Arc::clone(&self.transcoder),
                request,
                queued.clone(),
                logger,
            )
            .instrument(span),
        );

        Ok(JobHandle { queued, task })
    }
}

/// Body of the background task. Every outcome, including a panic inside the
/// transcoder, ends in a terminal record.
async fn run_split(
    registry: Arc<JobRegistry>,
    transcoder: Arc<dyn Transcoder>,
    request: SplitRequest,
    queued: JobRecord,
    logger: JobLogger,
) -> JobRecord {
    let processing = queued.into_processing();
    registry.set(processing.clone()).await;
    metrics::record_job_started();
    logger.log_start(&format!(
        "{} parts, mode {}",
        request.parts, request.mode
    ));

    let start = Instant::now();
    let result = AssertUnwindSafe(split_into_parts(
        transcoder.as_ref(),
        &request.source,
        &request.dest_dir,
        request.parts,
        &request.mode,
    ))
    .catch_unwind()
    .await;
    let elapsed = start.elapsed().as_secs_f64();

    let record = match result {
        Ok(Ok(outcome)) => {
            let produced = outcome.parts();
            if produced != outcome.plan.parts as usize {
                logger.log_warning(&format!(
                    "requested {} parts, produced {}",
                    outcome.plan.parts, produced
                ));
            }
            logger.log_completion(&format!("{} segments in {:.1}s", produced, elapsed));
            metrics::record_job_completed(&request.mode, produced, elapsed);
            processing.into_done(produced)
        }
        Ok(Err(e)) => {
            let message = e.to_string();
            logger.log_error(&message);
            metrics::record_job_failed(&request.mode, elapsed);
            processing.into_error(message)
        }
        Err(panic) => {
            let message = format!("split panicked: {}", panic_message(panic.as_ref()));
            logger.log_error(&message);
            metrics::record_job_failed(&request.mode, elapsed);
            processing.into_error(message)
        }
    };

    registry.set(record.clone()).await;
    record
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
