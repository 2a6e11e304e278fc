pub mod macros;
pub mod middleware_handling;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Message returned for every rejected credential or token check.
pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized";

/// Message shared by unknown-user and wrong-password login failures.
pub const USER_NOT_FOUND_MESSAGE: &str = "user not found";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Unauthorized: {0}")]
    UnauthorizedError(String),
    #[error("Storage error: {0:#}")]
    StorageError(anyhow::Error),
    #[error("Hashing error: {0}")]
    HashingError(String),
    #[error("Token error: {0}")]
    TokenError(String),
    #[error("Configuration error: {0:#}")]
    ConfigError(anyhow::Error),
    #[error("Server error: {0:#}")]
    ServerError(anyhow::Error),
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::UnauthorizedError(UNAUTHORIZED_MESSAGE.to_string())
    }

    /// Login failures collapse to this so callers cannot probe for usernames.
    pub fn user_not_found() -> Self {
        Self::NotFoundError(USER_NOT_FOUND_MESSAGE.to_string())
    }

    pub fn user_exists() -> Self {
        Self::ConflictError("user already exists".to_string())
    }

    pub fn missing_fields() -> Self {
        Self::ValidationError("missing required Register fields".to_string())
    }

    pub fn validation(field: &str, message: &str) -> Self {
        Self::ValidationError(format!("Validation failed for '{}': {}", field, message))
    }

    pub fn storage_operation_failed(operation: &str, resource: &str) -> Self {
        Self::StorageError(anyhow::anyhow!(
            "Storage operation '{}' failed on resource '{}'",
            operation,
            resource
        ))
    }

    /// Status code and stable machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::ConflictError(_) => (StatusCode::BAD_REQUEST, "CONFLICT"),
            Self::NotFoundError(_) => (StatusCode::BAD_REQUEST, "NOT_FOUND"),
            Self::UnauthorizedError(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            Self::HashingError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "HASHING_ERROR"),
            Self::TokenError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ERROR"),
            Self::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::ServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
        }
    }

    /// Message safe to show a client. Server-side failures never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            Self::ValidationError(msg)
            | Self::ConflictError(msg)
            | Self::NotFoundError(msg)
            | Self::UnauthorizedError(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::ServerError(error)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            error: error.into(),
            code: code.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error_code, status_code = %status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(error_code, status_code = %status.as_u16(), error = %self, "Request rejected");
        }

        let body = Json(ErrorResponse::new(status, self.public_message(), error_code));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// Extension trait to wrap foreign errors with a specific category
pub trait AppErrorExt<T> {
    fn config_err(self) -> AppResult<T>;
    fn storage_err(self) -> AppResult<T>;
    fn server_err(self) -> AppResult<T>;
}

impl<T, E> AppErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn config_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ConfigError(e.into()))
    }

    fn storage_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::StorageError(e.into()))
    }

    fn server_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ServerError(e.into()))
    }
}
