//! Application-wide error type and its HTTP mapping.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The store could not be reached. Transient; callers may retry.
    #[error("Store unavailable: {0}")]
    Connection(String),

    /// Rejected locally before any write.
    #[error("{0}")]
    Validation(String),

    /// Login resolved to no profile. Deliberately silent about which part
    /// of the credentials was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Record".to_string()),
            other => {
                tracing::error!(error = %other, "Database error");
                AppError::Connection(other.to_string())
            }
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Connection(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store and internal details stay in the logs.
        let message = match self {
            AppError::Connection(_) => "Service temporarily unavailable, please retry".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}
