pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtService, TokenError};
pub use password::{CredentialError, CredentialHasher};
