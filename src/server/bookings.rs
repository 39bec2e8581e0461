//! Booking handlers
//!
//! Lifecycle moves go through named transitions so that lesson status and
//! the instructor's decision are never written directly.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::models::booking::StatusChange;
use crate::models::{Booking, BookingView, NewBooking, Transition};
use crate::server::auth::Claims;
use crate::server::ServerState;

async fn load_booking(state: &ServerState, id: &str) -> ApiResult<Booking> {
    state
        .store
        .booking(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))
}

pub async fn create_booking(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    ApiJson(new): ApiJson<NewBooking>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    claims.require_self_or_admin(&new.learner_id)?;
    let booking = state.store.create_booking(&new).await?;
    info!("Booking {} created for {} with {}", booking.id, booking.learner_id, booking.instructor_id);
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn learner_bookings(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(learner_id): Path<String>,
) -> ApiResult<Json<Vec<BookingView>>> {
    claims.require_self_or_admin(&learner_id)?;
    Ok(Json(state.store.bookings_for_learner(&learner_id).await?))
}

pub async fn instructor_bookings(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(instructor_id): Path<String>,
) -> ApiResult<Json<Vec<BookingView>>> {
    claims.require_self_or_admin(&instructor_id)?;
    Ok(Json(state.store.bookings_for_instructor(&instructor_id).await?))
}

/// Admin: every booking, newest first
pub async fn all_bookings(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<BookingView>>> {
    claims.require_admin()?;
    Ok(Json(state.store.all_bookings().await?))
}

/// `{status: in-progress | completed | cancelled}` from either participant
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<Json<Booking>> {
    let transition = change.transition()?;
    let booking = load_booking(&state, &id).await?;
    if !booking.involves(&claims.sub) && !claims.is_admin() {
        return Err(ApiError::forbidden("Not a participant in this booking"));
    }
    Ok(Json(state.store.transition_booking(&id, transition).await?))
}

async fn decide(state: &ServerState, claims: &Claims, id: &str, transition: Transition) -> ApiResult<Booking> {
    let booking = load_booking(state, id).await?;
    claims.require_self_or_admin(&booking.instructor_id)?;
    let booking = state.store.transition_booking(id, transition).await?;
    info!("Booking {} {}", id, booking.accepted);
    Ok(booking)
}

pub async fn accept_booking(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(decide(&state, &claims, &id, Transition::Accept).await?))
}

pub async fn reject_booking(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(decide(&state, &claims, &id, Transition::Reject).await?))
}

/// Admin: remove a booking regardless of state
pub async fn delete_booking(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    claims.require_admin()?;
    state.store.delete_booking(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
