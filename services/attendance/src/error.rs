//! Custom error types for the attendance service
//!
//! Every operation exposed by the service reports failures through
//! [`ServiceError`]. The variants are the caller-visible outcomes; any
//! internal detail (database errors, token internals) is logged where it
//! occurs and collapsed into [`ServiceError::Unavailable`] so nothing
//! sensitive leaks through a response body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the attendance service
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ServiceError {
    /// Login rejected. Deliberately carries no reason: an unknown
    /// username and a wrong password are indistinguishable to callers.
    #[error("authentication failed")]
    AuthFailed,

    /// Request carries no token, or a token that failed validation
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated caller is not permitted to perform the action
    #[error("forbidden")]
    Forbidden,

    /// Submitted attendance status is not one of the known values
    #[error("invalid attendance status")]
    InvalidStatus,

    /// Referenced class does not exist
    #[error("class not found")]
    ClassNotFound,

    /// Referenced student does not exist or is not a student account
    #[error("invalid student")]
    InvalidStudent,

    /// Referenced teacher does not exist or is not a teacher account
    #[error("invalid teacher")]
    InvalidTeacher,

    /// An attendance record for this (class, student, date) already
    /// exists with a different status
    #[error("attendance already recorded for this class, student and date")]
    DuplicateRecord,

    /// Correction targeted a record that does not exist
    #[error("attendance record not found")]
    RecordNotFound,

    /// Registration username is already in use
    #[error("username already taken")]
    UsernameTaken,

    /// Request payload failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Too many failed logins for this username
    #[error("too many login attempts")]
    RateLimited,

    /// Backend failure; the operation may succeed on retry
    #[error("service unavailable")]
    Unavailable,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::AuthFailed | ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::InvalidStatus
            | ServiceError::InvalidStudent
            | ServiceError::InvalidTeacher
            | ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::ClassNotFound | ServiceError::RecordNotFound => StatusCode::NOT_FOUND,
            ServiceError::DuplicateRecord | ServiceError::UsernameTaken => StatusCode::CONFLICT,
            ServiceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;
