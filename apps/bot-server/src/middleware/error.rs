//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use dolle_core::{QuotaError, StoreError};
use dolle_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
///
/// Quota denials and provider failures are not errors here: they are normal
/// replies. What reaches this type aborts the command.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::StoreUnavailable(detail) => {
                tracing::error!("Usage store unavailable: {}", detail);
                ErrorResponse::store_unavailable()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Serialization(msg) | StoreError::Missing(msg) => AppError::Internal(msg),
            StoreError::Connection(msg) | StoreError::Operation(msg) => {
                AppError::StoreUnavailable(msg)
            }
        }
    }
}

impl From<QuotaError> for AppError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::Store(e) => e.into(),
            QuotaError::InvalidQuery(e) => AppError::BadRequest(e.to_string()),
            e @ QuotaError::WindowOverflow(_) => AppError::Internal(e.to_string()),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
