use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Id, Thing};
use uuid::Uuid;

pub const USERS_TABLE: &str = "users";

/// A persisted account. Only the store and the account service ever see the
/// password hash; everything leaving the service is a [`UserProfile`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(default = "User::generate_id")]
    pub id: Thing,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    fn generate_id() -> Thing {
        Thing::from((USERS_TABLE.to_string(), Uuid::new_v4().to_string()))
    }

    /// `email` is expected to be normalized already.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Self::generate_id(),
            username,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// The record key without the table prefix or any escaping.
    pub fn key(&self) -> String {
        record_key(&self.id)
    }
}

/// Key part of a record id. String keys are returned verbatim since their
/// `Display` form is escaped and the escape style differs between releases.
pub fn record_key(thing: &Thing) -> String {
    match &thing.id {
        Id::String(key) => key.clone(),
        other => clean_record_key(&other.to_string()),
    }
}

/// Strip SurrealDB escaping (`⟨⟩` or backticks) from a key taken from user input.
pub fn clean_record_key(raw: &str) -> String {
    let raw = raw.trim();
    raw.strip_prefix('⟨')
        .and_then(|k| k.strip_suffix('⟩'))
        .or_else(|| raw.strip_prefix('`').and_then(|k| k.strip_suffix('`')))
        .unwrap_or(raw)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
}

// Convert User to UserProfile (hiding sensitive data)
impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.key(),
            email: user.email,
            username: user.username,
        }
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.key(),
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// Body of `POST /register` and `POST /users`. Fields are optional so that a
/// missing field is reported as a validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: String,
}
