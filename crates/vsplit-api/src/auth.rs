//! Bearer token authentication.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vsplit_models::{VideoId, VideoMeta};
use vsplit_storage::StorageError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
struct UserEntry {
    password: String,
    role: Role,
}

/// Known users and their credentials.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: HashMap<String, UserEntry>,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl UserDirectory {
    /// The two built-in accounts.
    pub fn builtin() -> Self {
        let mut users = HashMap::new();
        users.insert(
            "admin".to_string(),
            UserEntry {
                password: "admin123".to_string(),
                role: Role::Admin,
            },
        );
        users.insert(
            "user".to_string(),
            UserEntry {
                password: "user123".to_string(),
                role: Role::User,
            },
        );
        Self { users }
    }

    /// Role of a user whose password matches.
    pub fn verify(&self, username: &str, password: &str) -> Option<Role> {
        self.users
            .get(username)
            .filter(|entry| entry.password == password)
            .map(|entry| entry.role)
    }

    pub fn role_of(&self, username: &str) -> Option<Role> {
        self.users.get(username).map(|entry| entry.role)
    }
}

/// Claims carried by issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for `username`.
    pub fn issue(&self, username: &str, role: Role) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            role,
            iat,
            exp: iat + self.ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token's signature and expiry.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                ApiError::unauthorized("Invalid token")
            })
    }
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners and admins may access a video.
    pub fn can_access(&self, meta: &VideoMeta) -> bool {
        self.is_admin() || meta.is_owned_by(&self.username)
    }

    /// Load a video's metadata, enforcing access rights.
    pub async fn authorize_video(&self, state: &AppState, video_id: &VideoId) -> ApiResult<VideoMeta> {
        let meta = match state.store.read_meta(video_id).await {
            Ok(meta) => meta,
            Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
                return Err(ApiError::not_found("Video not found"));
            }
            Err(e) => return Err(e.into()),
        };

        if !self.can_access(&meta) {
            return Err(ApiError::forbidden("Forbidden"));
        }
        Ok(meta)
    }
}

/// Axum extractor for authenticated user.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get Authorization header
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        // Extract Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.jwt.verify(token.trim())?;

        // Tokens of removed users stop working
        let role = state
            .users
            .role_of(&claims.sub)
            .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

        Ok(AuthUser {
            username: claims.sub,
            role,
        })
    }
}
