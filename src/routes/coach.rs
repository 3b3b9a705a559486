use axum::{
    extract::{Query, State},
    Json,
};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::AccountIdentity,
    models::{
        common::MonthQuery,
        reports::{CoachCourseOverview, CoachMonthlyReport},
    },
};

/// GET /api/v1/coach/courses
///
/// The calling account is the coach.
#[instrument(skip(state))]
pub async fn get_coach_courses(
    State(state): State<AppState>,
    identity: AccountIdentity,
) -> Result<Json<Vec<CoachCourseOverview>>> {
    let overview = state
        .metrics_service
        .coach_course_overview(identity.account_id)
        .await?;

    Ok(Json(overview))
}

/// GET /api/v1/coach/revenue?year=2025&month=3
#[instrument(skip(state))]
pub async fn get_monthly_revenue(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Query(query): Query<MonthQuery>,
) -> Result<Json<CoachMonthlyReport>> {
    query
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let report = state
        .metrics_service
        .coach_monthly_report(identity.account_id, query.year, query.month)
        .await?;

    Ok(Json(report))
}
