use app_config::{JwtConfig, MAX_JWT_EXPIRY_HOURS};
use app_error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("failed to issue token: {0}")]
    Issue(String),
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Issue(msg) => AppError::TokenError(msg),
            // Callers never learn which check failed.
            _ => AppError::unauthorized(),
        }
    }
}

/// Issues and validates HS256 bearer tokens carrying a user id.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl JwtService {
    pub fn new(secret: &[u8], expiry_hours: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry: Self::lifetime(expiry_hours),
        }
    }

    // Out-of-range lifetimes saturate; issuing then fails instead of wrapping.
    fn lifetime(expiry_hours: u64) -> Duration {
        i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX)
    }

    pub fn from_config(config: &JwtConfig) -> AppResult<Self> {
        if !config.algorithm.eq_ignore_ascii_case("HS256") {
            return Err(AppError::validation(
                "security.jwt.algorithm",
                "only HS256 is supported",
            ));
        }
        if config.expiry_hours == 0 || config.expiry_hours > MAX_JWT_EXPIRY_HOURS {
            return Err(AppError::validation(
                "security.jwt.expiry_hours",
                "lifetime is out of range",
            ));
        }
        if config.secret.is_empty() {
            return Err(AppError::validation(
                "security.jwt.secret",
                "secret cannot be empty",
            ));
        }

        Ok(Self::new(config.secret.as_bytes(), config.expiry_hours))
    }

    /// Issue a token for `subject` valid for the configured lifetime.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_with_ttl(subject, self.expiry)
    }

    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Issue("token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Validate a token and return its subject.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                let kind = match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    _ => TokenError::Malformed,
                };
                warn!("Token validation failed: {}", kind);
                kind
            })?;

        if token_data.claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }

        debug!("Token validated for subject: {}", token_data.claims.sub);
        Ok(token_data.claims.sub)
    }
}
