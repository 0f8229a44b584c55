use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::dto::ErrorResponse;
use crate::store::StoreError;

/// Every failure a handler can surface to the client.
///
/// Rendered as `{ "message": ..., "error"?: ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Schema-level violations: blank required fields, duplicate unique keys.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Duplicate email or review. Reported as 400 like other client errors.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UploadRejected(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Request body the extractor could not read; keeps the extractor's status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidCredentials
            | AppError::Conflict(_)
            | AppError::UploadRejected(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rejected { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => AppError::Validation(format!("Duplicate value for {}", key)),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                ErrorResponse {
                    message: "Internal server error".to_string(),
                    error: Some(e.to_string()),
                }
            }
            other => {
                tracing::debug!(status = status.as_u16(), "Request failed: {}", other);
                ErrorResponse {
                    message: other.to_string(),
                    error: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
