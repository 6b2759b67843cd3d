//! Job metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, gauge, histogram};

pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "vsplit_jobs_submitted_total";
    pub const JOBS_REJECTED_TOTAL: &str = "vsplit_jobs_rejected_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vsplit_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vsplit_jobs_failed_total";
    pub const JOBS_RUNNING: &str = "vsplit_jobs_running";
    pub const JOB_DURATION_SECONDS: &str = "vsplit_job_duration_seconds";
    pub const SEGMENTS_PRODUCED_TOTAL: &str = "vsplit_segments_produced_total";
}

pub fn record_job_submitted(mode: &str) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);
}

pub fn record_job_rejected(mode: &str) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_REJECTED_TOTAL, &labels).increment(1);
}

pub fn record_job_started() {
    gauge!(names::JOBS_RUNNING).increment(1.0);
}

pub fn record_job_completed(mode: &str, segments: usize, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    counter!(names::SEGMENTS_PRODUCED_TOTAL, &labels).increment(segments as u64);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
    gauge!(names::JOBS_RUNNING).decrement(1.0);
}

pub fn record_job_failed(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
    gauge!(names::JOBS_RUNNING).decrement(1.0);
}
