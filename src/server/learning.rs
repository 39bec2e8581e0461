//! Reviews and learner progress

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::models::{NewReview, ProgressUpdate, Review, SkillProgress};
use crate::server::auth::Claims;
use crate::server::ServerState;
use crate::types::Role;

/// Learners see their own progress; instructors and admins see anyone's
fn require_progress_access(claims: &Claims, learner_id: &str) -> ApiResult<()> {
    if claims.role == Role::Instructor || claims.sub == learner_id || claims.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Not allowed to access this learner's progress"))
    }
}

pub async fn create_review(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    ApiJson(review): ApiJson<NewReview>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    claims.require_self_or_admin(&review.learner_id)?;
    let review = state.store.create_review(&review).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn get_progress(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(learner_id): Path<String>,
) -> ApiResult<Json<Vec<SkillProgress>>> {
    require_progress_access(&claims, &learner_id)?;
    Ok(Json(state.store.progress_for(&learner_id).await?))
}

pub async fn update_progress(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    ApiJson(update): ApiJson<ProgressUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    require_progress_access(&claims, &update.learner_id)?;
    state.store.upsert_progress(&update).await?;
    Ok(Json(serde_json::json!({ "message": "Progress updated" })))
}
