//! Axum HTTP API server.
//!
//! This crate provides:
//! - Bearer token login for the built-in users
//! - Video upload, listing and download
//! - Synchronous and background splitting with job status polling
//! - Security headers, request logging and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, JwtKeys, Role, UserDirectory};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
