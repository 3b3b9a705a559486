use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::Result,
    middleware::AccountIdentity,
    models::credits::{CreditPackage, CreditPurchaseRecord, CreditSummary},
};

/// GET /api/v1/credits
#[instrument(skip(state))]
pub async fn get_credit_summary(
    State(state): State<AppState>,
    identity: AccountIdentity,
) -> Result<Json<CreditSummary>> {
    let summary = state
        .metrics_service
        .account_credit_summary(identity.account_id)
        .await?;

    Ok(Json(summary))
}

/// GET /api/v1/credits/purchases
#[instrument(skip(state))]
pub async fn get_purchase_history(
    State(state): State<AppState>,
    identity: AccountIdentity,
) -> Result<Json<Vec<CreditPurchaseRecord>>> {
    let purchases = state
        .ledger_service
        .purchase_history(identity.account_id)
        .await?;

    Ok(Json(purchases))
}

/// GET /api/v1/credit-packages
#[instrument(skip(state))]
pub async fn list_packages(State(state): State<AppState>) -> Result<Json<Vec<CreditPackage>>> {
    Ok(Json(state.ledger_service.list_packages().await?))
}

/// POST /api/v1/credit-packages/{package_id}/purchase
#[instrument(skip(state))]
pub async fn purchase_package(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Path(package_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CreditPurchaseRecord>)> {
    let purchase = state
        .ledger_service
        .purchase_package(identity.account_id, package_id)
        .await?;

    Ok((StatusCode::CREATED, Json(purchase)))
}
