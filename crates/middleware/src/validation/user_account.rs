use app_error::{AppError, AppResult, validation_error};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Applied to the lower-cased, trimmed address
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^([a-z0-9_+]([a-z0-9_+.]*[a-z0-9_+])?)@([a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,6})$"
    ).unwrap();

    // Alphanumeric characters, underscores, and hyphens, 3-30 characters
    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9_-]{3,30}$"
    ).unwrap();
}

/// Registration input after presence and format checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    /// Lower-cased and trimmed.
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub username: String,
    pub password: String,
}

/// Lower-case and trim an email so lookups and uniqueness are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a username
pub fn validate_username(username: &str) -> AppResult<()> {
    if !USERNAME_REGEX.is_match(username) {
        return validation_error!(
            "username",
            "must be 3-30 characters long and can only contain letters, numbers, underscores, and hyphens"
        );
    }

    Ok(())
}

/// Validates an already normalized email address
pub fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_REGEX.is_match(email) {
        return validation_error!("email", "invalid email format");
    }

    Ok(())
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// All three fields must be present and non-blank before any format check runs.
pub fn validate_registration(
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> AppResult<ValidRegistration> {
    let (Some(username), Some(email), Some(password)) =
        (present(username), present(email), present(password))
    else {
        return Err(AppError::missing_fields());
    };

    let username = username.trim().to_string();
    let email = normalize_email(&email);

    validate_username(&username)?;
    validate_email(&email)?;

    Ok(ValidRegistration {
        username,
        email,
        password,
    })
}

/// Login only checks presence. Format errors would tell a caller which
/// usernames can exist.
pub fn validate_login(
    username: Option<String>,
    password: Option<String>,
) -> AppResult<ValidLogin> {
    match (present(username), present(password)) {
        (Some(username), Some(password)) => Ok(ValidLogin {
            username: username.trim().to_string(),
            password,
        }),
        _ => validation_error!("credentials", "username and password are required"),
    }
}
