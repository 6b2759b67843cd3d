//! In-memory job registry.
//!
//! Holds the latest record per job ID for the lifetime of the process. All
//! access goes through a single lock held only for the duration of one read
//! or one replacement, so readers never wait on a running split.

use std::collections::HashMap;
use tokio::sync::Mutex;

use vsplit_models::{JobId, JobRecord, JobSnapshot};

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record stored under its ID.
    pub async fn set(&self, record: JobRecord) {
        let mut jobs = self.jobs.lock().await;
        jobs.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.lock().await.get(id).cloned()
    }

    /// Current state of a job, or `unknown` when it was never submitted.
    pub async fn query(&self, id: &JobId) -> JobSnapshot {
        self.get(id).await.into()
    }

    /// Store `record` unless `guard_inflight` is set and a queued or
    /// processing record already exists for the same ID, in which case the
    /// existing record is returned and nothing is written.
    pub async fn claim(&self, record: JobRecord, guard_inflight: bool) -> Result<(), JobRecord> {
        let mut jobs = self.jobs.lock().await;
        if guard_inflight {
            if let Some(existing) = jobs.get(&record.id) {
                if existing.is_in_flight() {
                    return Err(existing.clone());
                }
            }
        }
        jobs.insert(record.id.clone(), record);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Number of records that are queued or processing.
    pub async fn in_flight(&self) -> usize {
        self.jobs
            .lock()
            .await
            .values()
            .filter(|r| r.is_in_flight())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsplit_models::JobStatus;

    #[tokio::test]
    async fn test_unknown_id() {
        let registry = JobRegistry::new();
        let snapshot = registry.query(&JobId::from("v3")).await;
        assert_eq!(snapshot.status_str(), "unknown");
        assert!(snapshot.record().is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_replaces_whole_record() {
        let registry = JobRegistry::new();
        let queued = JobRecord::queued(JobId::from("v1"), "fast");
        registry.set(queued.clone()).await;
        assert_eq!(registry.get(&queued.id).await, Some(queued.clone()));

        let done = queued.clone().into_processing().into_done(4);
        registry.set(done.clone()).await;
        assert_eq!(registry.get(&queued.id).await, Some(done.clone()));
        assert_eq!(registry.len().await, 1);

        // Re-querying a terminal record returns the same value
        let first = registry.query(&queued.id).await;
        let second = registry.query(&queued.id).await;
        assert_eq!(first, second);
        assert_eq!(first.record().unwrap().status, JobStatus::Done);
    }

    #[tokio::test]
    async fn test_claim_without_guard_overwrites() {
        let registry = JobRegistry::new();
        let first = JobRecord::queued(JobId::from("v1"), "fast");
        registry.set(first.clone().into_processing()).await;

        let second = JobRecord::queued(JobId::from("v1"), "heavy");
        assert!(registry.claim(second.clone(), false).await.is_ok());
        assert_eq!(registry.get(&second.id).await.unwrap().mode, "heavy");
    }

    #[tokio::test]
    async fn test_claim_with_guard() {
        let registry = JobRegistry::new();
        let id = JobId::from("v1");
        let running = JobRecord::queued(id.clone(), "fast").into_processing();
        registry.set(running.clone()).await;

        let rejected = registry
            .claim(JobRecord::queued(id.clone(), "heavy"), true)
            .await
            .unwrap_err();
        assert_eq!(rejected, running);
        assert_eq!(registry.in_flight().await, 1);

        registry.set(running.into_done(2)).await;
        assert!(registry
            .claim(JobRecord::queued(id.clone(), "heavy"), true)
            .await
            .is_ok());
        assert_eq!(registry.get(&id).await.unwrap().status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_ids_are_independent() {
        let registry = JobRegistry::new();
        registry.set(JobRecord::queued(JobId::from("a"), "fast")).await;
        registry
            .set(JobRecord::queued(JobId::from("b"), "heavy").into_processing())
            .await;

        assert_eq!(registry.query(&JobId::from("a")).await.status_str(), "queued");
        assert_eq!(
            registry.query(&JobId::from("b")).await.status_str(),
            "processing"
        );
        assert_eq!(registry.len().await, 2);
    }
}
