//! Shared data models for the vsplit service.
//!
//! This crate provides Serde-serializable types for:
//! - Video identifiers and stored video metadata
//! - Split job records and their lifecycle states
//! - Segment listings

pub mod job;
pub mod segment;
pub mod video;

// Re-export common types
pub use job::{JobId, JobRecord, JobSnapshot, JobStatus};
pub use segment::SegmentOutput;
pub use video::{VideoId, VideoMeta};
