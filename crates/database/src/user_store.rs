use app_error::{AppError, AppResult};
use app_models::{USERS_TABLE, User, user::clean_record_key};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{Database, DbService};

/// Persistence boundary for accounts.
///
/// Implementations must treat `email` and `username` as independently unique
/// and report a violation from `create_user` as [`AppError::ConflictError`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: User) -> AppResult<User>;

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Lookup is case-insensitive; stored emails are lower-case.
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn get_by_id(&self, id: &str) -> AppResult<Option<User>>;

    async fn list_all(&self) -> AppResult<Vec<User>>;

    async fn delete_by_id(&self, id: &str) -> AppResult<Option<User>>;
}

pub struct SurrealUserStore {
    users: DbService<User>,
}

impl SurrealUserStore {
    /// Wraps the `users` table and makes sure its unique indexes exist.
    pub async fn new(db: Arc<Database>) -> AppResult<Self> {
        let users = DbService::new(db, USERS_TABLE);
        users.define_unique_index("email").await?;
        users.define_unique_index("username").await?;
        info!("User store ready with unique email and username indexes");
        Ok(Self { users })
    }

    fn is_unique_violation(error: &AppError) -> bool {
        let AppError::StorageError(err) = error else {
            return false;
        };

        match err.downcast_ref::<surrealdb::Error>() {
            Some(surrealdb::Error::Db(surrealdb::error::Db::IndexExists { .. })) => true,
            // Remote engines only hand back the rendered message
            Some(surrealdb::Error::Api(api)) => api.to_string().contains("already contains"),
            _ => false,
        }
    }
}

#[async_trait]
impl UserStore for SurrealUserStore {
    async fn create_user(&self, user: User) -> AppResult<User> {
        let username = user.username.clone();
        match self.users.create_record(user).await {
            Ok(Some(stored)) => {
                debug!(user_id = %stored.key(), "Stored new user");
                Ok(stored)
            }
            Ok(None) => Err(AppError::storage_operation_failed("create", USERS_TABLE)),
            Err(e) if Self::is_unique_violation(&e) => {
                info!(%username, "Insert rejected by unique index");
                Err(AppError::user_exists())
            }
            Err(e) => Err(e),
        }
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self
            .users
            .get_records_by_field("username", username.to_string())
            .await?;
        Ok(users.into_iter().next())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self
            .users
            .get_records_by_field("email", email.trim().to_lowercase())
            .await?;
        Ok(users.into_iter().next())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.users.get_record_by_id(&clean_record_key(id)).await
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        self.users.list_records("created_at").await
    }

    async fn delete_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.users.delete_record(&clean_record_key(id)).await
    }
}
