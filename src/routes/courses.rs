use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::AccountIdentity,
    models::bookings::{Booking, CancelOutcome, EnrollOutcome},
};

/// POST /api/v1/courses/{course_id}/enroll
///
/// Spends one credit. `201` with the new booking, or one of
/// `NOT_FOUND`, `ALREADY_ENROLLED`, `INSUFFICIENT_CREDIT`, `CAPACITY_EXCEEDED`.
#[instrument(skip(state))]
pub async fn enroll(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Path(course_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Booking>)> {
    match state
        .admission_service
        .enroll(identity.account_id, course_id)
        .await?
    {
        EnrollOutcome::Enrolled(booking) => Ok((StatusCode::CREATED, Json(booking))),
        EnrollOutcome::Rejected(reason) => Err(reason.into()),
    }
}

/// DELETE /api/v1/courses/{course_id}/enroll
#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    match state
        .admission_service
        .cancel(identity.account_id, course_id)
        .await?
    {
        CancelOutcome::Cancelled(booking) => Ok(Json(booking)),
        CancelOutcome::NotEnrolled => Err(ApiError::NotEnrolled),
    }
}
