//! Application state.

use std::sync::Arc;

use vsplit_jobs::{JobRegistry, JobRunner};
use vsplit_media::{FfmpegTranscoder, Transcoder};
use vsplit_storage::VideoStore;

use crate::auth::{JwtKeys, UserDirectory};
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: VideoStore,
    pub registry: Arc<JobRegistry>,
    pub runner: JobRunner,
    pub transcoder: Arc<dyn Transcoder>,
    pub jwt: Arc<JwtKeys>,
    pub users: Arc<UserDirectory>,
}

impl AppState {
    /// Create state backed by the configured ffmpeg and ffprobe executables.
    pub fn new(config: ApiConfig) -> Self {
        let transcoder = FfmpegTranscoder::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone());
        Self::with_transcoder(config, Arc::new(transcoder))
    }

    pub fn with_transcoder(config: ApiConfig, transcoder: Arc<dyn Transcoder>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let runner = JobRunner::new(Arc::clone(&registry), Arc::clone(&transcoder))
            .with_inflight_guard(config.guard_inflight);

        Self {
            store: VideoStore::new(config.data_dir.clone()),
            jwt: Arc::new(JwtKeys::new(&config.jwt_secret, config.token_ttl)),
            users: Arc::new(UserDirectory::builtin()),
            registry,
            runner,
            transcoder,
            config,
        }
    }
}
