//! API Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use securechain_core::LedgerError;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid OTP: {0}")]
    InvalidOtp(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("User has already voted")]
    AlreadyVoted,

    #[error("Unknown party: {0}")]
    InvalidParty(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::InvalidOtp(msg) => (
                StatusCode::UNAUTHORIZED,
                "invalid_otp",
                format!("Invalid OTP: {}. Please check the code and try again.", msg),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::AlreadyVoted => (
                StatusCode::BAD_REQUEST,
                "already_voted",
                "User has already voted".to_string(),
            ),
            ApiError::InvalidParty(id) => (
                StatusCode::BAD_REQUEST,
                "invalid_party",
                format!("Party {} is not on the ballot", id),
            ),
            ApiError::Ledger(LedgerError::AppendConflict { expected, found }) => (
                StatusCode::CONFLICT,
                "append_conflict",
                format!("Chain tail moved during append (expected index {expected}, found {found}); retry the vote"),
            ),
            ApiError::Ledger(LedgerError::Persistence(e)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "persistence_error",
                format!("Vote not recorded, retry later: {}", e),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}
