use app_error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Identity established by [`crate::api_middleware::require_auth`].
///
/// Handlers behind the auth layer take this as an extractor. Outside that
/// layer extraction fails with a generic 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedContext {
    pub subject_id: String,
}

impl<S> FromRequestParts<S> for AuthenticatedContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedContext>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}
