//! FFmpeg CLI wrapper for video splitting.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Duration probing through FFprobe
//! - Segment planning and processing profiles
//! - The `Transcoder` seam used by the job runner

pub mod command;
pub mod error;
pub mod probe;
pub mod segment;
pub mod transcoder;

pub use command::{check_tool, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration;
pub use segment::{list_segment_files, SplitPlan, SplitProfile, MIN_SEGMENT_SECS, SEGMENT_EXTENSION};
pub use transcoder::{split_into_parts, FfmpegTranscoder, SplitOutcome, Transcoder};
