//! Split job execution and status tracking.
//!
//! This crate provides:
//! - `JobRegistry`: the process-wide map from job ID to the latest record
//! - `JobRunner`: spawns a background task per split request and records
//!   every lifecycle transition in the registry
//! - Structured job logging and job metrics

pub mod error;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod runner;

pub use error::{JobError, JobResult};
pub use logging::JobLogger;
pub use registry::JobRegistry;
pub use runner::{JobHandle, JobRunner, SplitRequest};
