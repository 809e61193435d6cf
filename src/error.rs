//! Error types for the bookstore server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a rejected write together with the step that failed.
    pub fn constraint(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Constraint(format!("{}: {}", context, err))
    }

    /// Wrap a failed begin/commit.
    pub fn transaction(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Transaction(format!("{}: {}", context, err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Status code used when the error reaches a handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Constraint(_)
            | AppError::Transaction(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human readable cause
    pub error: String,
    /// Short summary of what failed
    pub message: String,
}

impl ErrorResponse {
    fn from_error(err: &AppError) -> Self {
        let (message, error) = match err {
            AppError::Validation(msg) => ("Invalid argument", msg.clone()),
            AppError::BadRequest(msg) => ("Bad request", msg.clone()),
            AppError::NotFound(msg) => ("Not found", msg.clone()),
            AppError::Constraint(msg) => {
                tracing::error!("Constraint violation: {}", msg);
                ("Storage error", "Write rejected by the database".to_string())
            }
            AppError::Transaction(msg) => {
                tracing::error!("Transaction error: {}", msg);
                ("Storage error", "Transaction failed".to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Storage error", "Database error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal error", "Internal server error".to_string())
            }
        };

        Self {
            error,
            message: message.to_string(),
        }
    }
}

/// Response for an error with an explicit status, used where an endpoint
/// deviates from the default mapping.
pub struct StatusError(pub StatusCode, pub AppError);

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        let StatusError(status, err) = self;
        (status, Json(ErrorResponse::from_error(&err))).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        StatusError(self.status_code(), self).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
