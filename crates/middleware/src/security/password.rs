use app_config::Argon2Config;
use app_error::{AppError, AppErrorExt, AppResult};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tracing::{debug, error};

/// Longest password accepted for hashing, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hashing(String),
    #[error("invalid password hash format: {0}")]
    InvalidHashFormat(String),
}

impl From<CredentialError> for AppError {
    fn from(error: CredentialError) -> Self {
        AppError::HashingError(error.to_string())
    }
}

/// Salted Argon2id hashing with a fixed cost policy.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &Argon2Config) -> AppResult<Self> {
        let params =
            Params::new(config.memory, config.iterations, config.parallelism, None).config_err()?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string. Every call uses a fresh salt.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(CredentialError::Hashing(format!(
                "password exceeds {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        let salt = SaltString::generate(&mut OsRng);

        debug!("Hashing password");
        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                CredentialError::Hashing(e.to_string())
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash using the salt and cost
    /// parameters embedded in that hash. A mismatch is `Ok(false)`.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool, CredentialError> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
            error!("Invalid password hash: {}", e);
            CredentialError::InvalidHashFormat(e.to_string())
        })?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::InvalidHashFormat(e.to_string())),
        }
    }
}
