//! Account and status handlers

use anyhow::Context;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::models::{RegisterRequest, UserSummary};
use crate::server::auth::{hash_password, verify_password, Claims};
use crate::server::ServerState;
use crate::types::UserStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub assistant_configured: bool,
}

pub async fn register_handler(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")??;
    let user = req.into_user(uuid::Uuid::new_v4().to_string(), password_hash);
    state.store.insert_user(&user).await?;
    let token = state.auth_state.issue_token(&user)?;

    info!("Registered {} {}", user.role, user.id);
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user: user.summary() })))
}

pub async fn login_handler(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    if let Some(remaining) = state.auth_state.is_locked(&email) {
        return Err(ApiError::TooManyRequests(format!(
            "Too many failed attempts. Try again in {} minutes",
            remaining.num_minutes() + 1
        )));
    }

    let user = state.store.user_by_email(&email).await?;
    let verified = match &user {
        Some(user) => {
            let (password, hash) = (req.password.clone(), user.password_hash.clone());
            tokio::task::spawn_blocking(move || verify_password(&password, &hash))
                .await
                .context("Password check task failed")??
        }
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        state.auth_state.record_failed_login(&email);
        warn!("Failed login for {}", email);
        return Err(ApiError::bad_request("Invalid credentials"));
    };

    if user.status == UserStatus::Inactive {
        return Err(ApiError::forbidden("Account is inactive"));
    }

    state.auth_state.clear_login_attempts(&email);
    let token = state.auth_state.issue_token(&user)?;
    Ok(Json(AuthResponse { token, user: user.summary() }))
}

/// Revoke the caller's token
pub async fn logout_handler(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
) -> StatusCode {
    state.auth_state.revoke_token(&claims.jti);
    StatusCode::NO_CONTENT
}

pub async fn status_handler(State(state): State<ServerState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        assistant_configured: state.assistant.is_configured(),
    })
}
