//! Local filesystem storage for uploaded videos.
//!
//! This crate provides:
//! - Per-video directories with the source file and `meta.json`
//! - Video listing, newest first
//! - Segment output listing and download path resolution

pub mod error;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{validate_key, VideoStore, META_FILE, SEGMENTS_DIR_PREFIX, SOURCE_FILE};
