use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::models::{ApiResponse, AppointmentStatus};

/// Domain-level failures of the booking core. Everything the validator can
/// detect is rejected here, before any store call; `QueryFailed` and
/// `Transport` are the two collaborator-side failures (a non-200 envelope
/// code versus a network/database-level error).
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("duration must be a positive number of minutes")]
    InvalidDuration,

    #[error("appointment must be scheduled strictly in the future")]
    PastOrPresentSchedule,

    #[error("cannot change status from {from} to {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error("query failed ({code}): {message}")]
    QueryFailed { code: i32, message: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        BookingError::Transport(format!("db error: {e}"))
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Internal(String),
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("INVALID_CREDENTIALS", "Username or password is incorrect".into())
    }

    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired".into())
    }

    fn envelope(status: StatusCode, message: &str) -> Json<ApiResponse<Value>> {
        Json(ApiResponse::failure(status.as_u16() as i32, message))
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::MissingField(_) => ApiError::BadRequest("VALIDATION_ERROR", e.to_string()),
            BookingError::InvalidDuration => ApiError::BadRequest("VALIDATION_ERROR", e.to_string()),
            BookingError::PastOrPresentSchedule => {
                ApiError::BadRequest("VALIDATION_ERROR", e.to_string())
            }
            BookingError::IllegalTransition { .. } => {
                ApiError::BadRequest("ILLEGAL_TRANSITION", e.to_string())
            }
            BookingError::Forbidden(msg) => ApiError::Forbidden("FORBIDDEN", msg),
            BookingError::QueryFailed { code, message } => match code {
                404 => ApiError::NotFound("QUERY_FAILED", message),
                409 => ApiError::Conflict("QUERY_FAILED", message),
                500.. => ApiError::Internal(message),
                _ => ApiError::BadRequest("QUERY_FAILED", message),
            },
            BookingError::Transport(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Error bodies reuse the {code, message, data} envelope so clients
        // can key off `code` alone.
        let (status, code, msg) = match self {
            ApiError::Unauthorized(code, msg) => (StatusCode::UNAUTHORIZED, code, msg),
            ApiError::Forbidden(code, msg) => (StatusCode::FORBIDDEN, code, msg),
            ApiError::BadRequest(code, msg) => (StatusCode::BAD_REQUEST, code, msg),
            ApiError::NotFound(code, msg) => (StatusCode::NOT_FOUND, code, msg),
            ApiError::Conflict(code, msg) => (StatusCode::CONFLICT, code, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg),
        };
        tracing::debug!(%code, "request rejected: {msg}");
        (status, ApiError::envelope(status, &msg)).into_response()
    }
}
