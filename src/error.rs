use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;

use crate::models::bookings::EnrollRejection;

/// Faults raised by the ledger, booking and admission services.
///
/// Business rejections (already enrolled, no credit left, course full) are not
/// errors; they come back as outcome values.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Transient conflict: gave up after {attempts} attempts, safe to retry")]
    TransientConflict { attempts: u32 },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Lock waits, serialization failures and deadlocks: the attempt can be replayed
/// from scratch.
pub fn is_transient(err: &DbErr) -> bool {
    let msg = err.to_string().to_lowercase();
    [
        "40001",
        "40p01",
        "55p03",
        "could not serialize access",
        "deadlock detected",
        "lock timeout",
        "database is locked",
        "database table is locked",
    ]
    .iter()
    .any(|needle| msg.contains(needle))
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("unique") || msg.contains("duplicate") || msg.contains("23505")
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error("No active enrollment for this course")]
    NotEnrolled,

    #[error("No remaining credit")]
    InsufficientCredit,

    #[error("Course has reached its capacity")]
    CapacityExceeded,

    #[error("Conflicting requests, please retry")]
    TransientConflict,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Database(e) => ApiError::Database(e),
            EngineError::TransientConflict { .. } => ApiError::TransientConflict,
            EngineError::BadRequest(msg) => ApiError::BadRequest(msg),
            EngineError::NotFound(msg) => ApiError::NotFound(msg),
            EngineError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<EnrollRejection> for ApiError {
    fn from(rejection: EnrollRejection) -> Self {
        match rejection {
            EnrollRejection::NotFound => ApiError::NotFound("Course not found".to_string()),
            EnrollRejection::AlreadyEnrolled => ApiError::AlreadyEnrolled,
            EnrollRejection::InsufficientCredit => ApiError::InsufficientCredit,
            EnrollRejection::CapacityExceeded => ApiError::CapacityExceeded,
        }
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::AlreadyEnrolled => (
                StatusCode::BAD_REQUEST,
                "ALREADY_ENROLLED",
                self.to_string(),
            ),
            ApiError::NotEnrolled => (StatusCode::BAD_REQUEST, "NOT_ENROLLED", self.to_string()),
            ApiError::InsufficientCredit => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_CREDIT",
                self.to_string(),
            ),
            ApiError::CapacityExceeded => (
                StatusCode::CONFLICT,
                "CAPACITY_EXCEEDED",
                self.to_string(),
            ),
            ApiError::TransientConflict => (
                StatusCode::SERVICE_UNAVAILABLE,
                "TRANSIENT_CONFLICT",
                self.to_string(),
            ),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        let body = json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

// Helper type for results
pub type Result<T> = std::result::Result<T, ApiError>;
