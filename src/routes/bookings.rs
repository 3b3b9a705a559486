use axum::{extract::State, Json};
use tracing::instrument;

use crate::{
    app_state::AppState, error::Result, middleware::AccountIdentity,
    models::bookings::BookingHistoryEntry,
};

/// GET /api/v1/bookings
#[instrument(skip(state))]
pub async fn get_booking_history(
    State(state): State<AppState>,
    identity: AccountIdentity,
) -> Result<Json<Vec<BookingHistoryEntry>>> {
    let history = state
        .metrics_service
        .account_booking_history(identity.account_id)
        .await?;

    Ok(Json(history))
}
