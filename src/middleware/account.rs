//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! account id in `x-account-id`. This layer only parses it.

use crate::error::{ApiError, Result};
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Request extension carrying the account the request acts for
#[derive(Debug, Clone, Copy)]
pub struct AccountIdentity {
    pub account_id: Uuid,
}

/// Parses `x-account-id` and stores the identity in request extensions.
///
/// Returns 401 Unauthorized if the header is missing or is not a UUID.
pub async fn account_identity_middleware(mut request: Request, next: Next) -> Result<Response> {
    let raw = request
        .headers()
        .get(ACCOUNT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-Account-Id header".to_string()))?;

    let account_id = Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::Unauthorized("Invalid X-Account-Id header".to_string()))?;

    request
        .extensions_mut()
        .insert(AccountIdentity { account_id });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AccountIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccountIdentity>()
            .copied()
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "Account identity not found - route must be behind account_identity_middleware"
                        .to_string(),
                )
            })
    }
}
