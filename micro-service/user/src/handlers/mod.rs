pub mod accounts;
pub mod health;

use app_error::AppError;
use axum::extract::rejection::JsonRejection;
use tracing::debug;

// Unparseable bodies get the same error shape as any other validation failure
pub(crate) fn reject_body(rejection: JsonRejection) -> AppError {
    debug!("Rejected request body: {}", rejection.body_text());
    AppError::ValidationError(format!("Invalid request body: {}", rejection.body_text()))
}
