//! Login handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::Role;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 256, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

/// Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    request.validate()?;

    let role = match state.users.verify(&request.username, &request.password) {
        Some(role) => role,
        None => {
            warn!(username = %request.username, "Login failed");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    let token = state.jwt.issue(&request.username, role)?;
    info!(username = %request.username, role = %role, "Login succeeded");

    Ok(Json(LoginResponse { token, role }))
}
