use app_middleware::JwtService;
use std::sync::Arc;

use crate::service::AccountServiceTrait;

/// Shared by every handler. Everything inside is immutable and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountServiceTrait>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(accounts: Arc<dyn AccountServiceTrait>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            accounts,
            jwt_service,
        }
    }
}
