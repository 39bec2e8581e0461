//! Profile and account administration handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::models::{ProfileUpdate, User, UserListing};
use crate::server::auth::Claims;
use crate::server::ServerState;
use crate::types::UserStatus;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

/// Admin: every account
pub async fn list_users(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<UserListing>>> {
    claims.require_admin()?;
    Ok(Json(state.store.list_users().await?))
}

pub async fn get_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .user_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    claims.require_self_or_admin(&id)?;
    state.store.update_profile(&id, &update).await?;
    Ok(Json(serde_json::json!({ "message": "Profile updated successfully" })))
}

/// Admin: activate or deactivate an account
pub async fn set_user_status(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    claims.require_admin()?;
    let status: UserStatus = body
        .status
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status value"))?;
    state.store.set_user_status(&id, status).await?;
    info!("User {} set {}", id, status.as_str());
    Ok(Json(serde_json::json!({ "message": format!("User status updated to {}", status.as_str()) })))
}

/// Admin: remove an account and everything attached to it
pub async fn delete_user(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    claims.require_admin()?;
    state.store.delete_user(&id).await?;
    info!("User {} deleted by {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}
