//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Root directory for uploaded videos and segments
    pub data_dir: PathBuf,
    /// Optional static web assets served under `/web`
    pub static_dir: PathBuf,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// Bearer token lifetime
    pub token_ttl: Duration,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
    /// ffprobe executable
    pub ffprobe_path: PathBuf,
    /// Reject a background split while the previous one for the same video runs
    pub guard_inflight: bool,
    /// Expose Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
            static_dir: PathBuf::from("static"),
            jwt_secret: "dev-only-change-me".to_string(),
            token_ttl: Duration::from_secs(8 * 3600),
            cors_origins: vec!["*".to_string()],
            max_body_size: 2 * 1024 * 1024 * 1024, // 2GB
            environment: "development".to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            guard_inflight: false,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl: env_parse::<u64>("TOKEN_TTL_HOURS")
                .and_then(ttl_from_hours)
                .unwrap_or(defaults.token_ttl),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_path),
            guard_inflight: env_flag("JOBS_GUARD_INFLIGHT").unwrap_or(defaults.guard_inflight),
            metrics_enabled: env_flag("METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        is_production_env(&self.environment)
    }

    pub fn is_default_secret(&self) -> bool {
        self.jwt_secret == Self::default().jwt_secret
    }
}

/// Whether an `ENVIRONMENT` value names production, ignoring case.
pub fn is_production_env(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("production")
}

/// Token lifetime for `hours`, or `None` when it does not fit.
fn ttl_from_hours(hours: u64) -> Option<Duration> {
    hours.checked_mul(3600).map(Duration::from_secs)
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
