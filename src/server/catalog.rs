//! Public catalog: instructors, learners and lesson packages

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, ApiQuery, ApiResult};
use crate::models::package::{self, PackageListing};
use crate::models::{InstructorCard, InstructorProfile, LearnerListing, ReviewView, SearchQuery};
use crate::server::ServerState;

/// `GET /api/instructors?vehicle=Auto&sort=price`
pub async fn list_instructors(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<InstructorCard>>> {
    let cards = state.store.instructor_cards().await?;
    Ok(Json(query.apply(cards)))
}

pub async fn get_instructor(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<InstructorProfile>> {
    let profile = state
        .store
        .instructor_profile(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Instructor not found"))?;
    Ok(Json(profile))
}

pub async fn instructor_reviews(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ReviewView>>> {
    Ok(Json(state.store.reviews_for_instructor(&id).await?))
}

pub async fn list_learners(State(state): State<ServerState>) -> ApiResult<Json<Vec<LearnerListing>>> {
    Ok(Json(state.store.learners().await?))
}

pub async fn list_packages() -> Json<Vec<PackageListing>> {
    Json(package::listings())
}
