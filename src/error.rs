//! Service Errors
//! Mission: One caller-visible error taxonomy for both services

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Domain errors recognized at the HTTP boundary.
///
/// Everything that is not a domain outcome ends up in `Internal`, whose
/// details are logged but never sent to the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("user already exists")]
    AlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Covers every token failure: malformed, expired, bad signature, unknown subject.
    #[error("invalid or expired token")]
    Unauthenticated,
    #[error("call not found")]
    NotFound,
    #[error("access denied")]
    Forbidden,
    #[error("invalid status")]
    InvalidStatus,
    #[error("invalid phone number format")]
    InvalidFormat,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::AlreadyExists => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials | ServiceError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::InvalidStatus
            | ServiceError::InvalidFormat
            | ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ServiceError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Unreadable request bodies (bad JSON, wrong content type, mistyped
/// fields) answer 400 in the same `{"error": ..}` shape as everything else.
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::InvalidArgument(rejection.body_text())
    }
}

/// Store-level failures, kept apart from `ServiceError` so a uniqueness
/// violation can be told from any other write failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict
            }
            other => StoreError::Backend(other.into()),
        }
    }
}
