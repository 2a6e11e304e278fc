pub mod api_middleware;
pub mod context;
pub mod security;
pub mod validation;

pub use api_middleware::{logging_middleware, require_auth, security_headers_middleware};
pub use context::AuthenticatedContext;
pub use security::jwt::{Claims, JwtService, TokenError};
pub use security::password::{CredentialError, CredentialHasher};
