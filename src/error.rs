//! Error types for Biblios server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchRecord = 4,
    BadValue = 5,
    Duplicate = 6,
    OutOfStock = 7,
    InvalidTransition = 8,
    PolicyViolation = 9,
    RenewalLimitExceeded = 10,
    OutstandingFine = 11,
    AlreadyOverdue = 12,
    InvariantViolation = 13,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// No available copy to reserve
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// Illegal issue state machine transition
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Business-rule block (too many active issues, inactive book, unresolved fines)
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Renewal limit exceeded: {0}")]
    RenewalLimitExceeded(String),

    #[error("Outstanding fine: {0}")]
    OutstandingFine(String),

    #[error("Already overdue: {0}")]
    AlreadyOverdue(String),

    /// Internal consistency failure (catalog/ledger desync). Never the
    /// caller's fault; logged and surfaced as a 500.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::OutOfStock(msg) => {
                (StatusCode::CONFLICT, ErrorCode::OutOfStock, msg.clone())
            }
            AppError::InvalidTransition(msg) => {
                (StatusCode::CONFLICT, ErrorCode::InvalidTransition, msg.clone())
            }
            AppError::PolicyViolation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::PolicyViolation, msg.clone())
            }
            AppError::RenewalLimitExceeded(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::RenewalLimitExceeded, msg.clone())
            }
            AppError::OutstandingFine(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::OutstandingFine, msg.clone())
            }
            AppError::AlreadyOverdue(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::AlreadyOverdue, msg.clone())
            }
            AppError::InvariantViolation(msg) => {
                tracing::error!("Invariant violation: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InvariantViolation,
                    "Internal consistency failure".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
