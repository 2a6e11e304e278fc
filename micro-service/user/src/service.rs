use app_database::UserStore;
use app_error::{AppError, AppErrorExt, AppResult};
use app_middleware::{
    AuthenticatedContext, CredentialHasher, JwtService,
    validation::{self, ValidRegistration},
};
use app_models::{AuthResponse, LoginInput, RegisterInput, User, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Account use-cases exposed over HTTP.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    /// Register a new user
    async fn register(&self, input: RegisterInput) -> AppResult<UserProfile>;

    /// Create a user on behalf of an authenticated caller
    async fn add_user(
        &self,
        actor: &AuthenticatedContext,
        input: RegisterInput,
    ) -> AppResult<UserProfile>;

    /// Check credentials and issue a token
    async fn login(&self, input: LoginInput) -> AppResult<AuthResponse>;

    async fn list_users(&self) -> AppResult<Vec<UserProfile>>;

    async fn delete_user_by_id(&self, user_id: &str) -> AppResult<UserProfile>;
}

pub struct AccountService {
    store: Arc<dyn UserStore>,
    hasher: Arc<CredentialHasher>,
    jwt_service: Arc<JwtService>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<CredentialHasher>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            store,
            hasher,
            jwt_service,
        }
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt_service)
    }

    // Fails fast on an obvious duplicate so the hasher is never invoked for it.
    // The store's unique indexes still decide any race.
    async fn ensure_available(&self, username: &str, email: &str) -> AppResult<()> {
        if self.store.get_by_email(email).await?.is_some()
            || self.store.get_by_username(username).await?.is_some()
        {
            info!(%username, "Registration rejected, user already exists");
            return Err(AppError::user_exists());
        }

        Ok(())
    }

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .server_err()??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, password_hash: String) -> AppResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
            .await
            .server_err()??;
        Ok(matches)
    }

    async fn create_account(&self, input: RegisterInput) -> AppResult<UserProfile> {
        let ValidRegistration {
            username,
            email,
            password,
        } = validation::validate_registration(input.username, input.email, input.password)?;

        self.ensure_available(&username, &email).await?;

        let password_hash = self.hash_password(password).await?;
        let stored = self
            .store
            .create_user(User::new(username, email, password_hash))
            .await?;

        info!(user_id = %stored.key(), username = %stored.username, "User registered");
        Ok(UserProfile::from(stored))
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    async fn register(&self, input: RegisterInput) -> AppResult<UserProfile> {
        self.create_account(input).await
    }

    async fn add_user(
        &self,
        actor: &AuthenticatedContext,
        input: RegisterInput,
    ) -> AppResult<UserProfile> {
        let profile = self.create_account(input).await?;
        info!(actor = %actor.subject_id, user_id = %profile.id, "User added by authenticated caller");
        Ok(profile)
    }

    async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        let credentials = validation::validate_login(input.username, input.password)?;

        let Some(user) = self.store.get_by_username(&credentials.username).await? else {
            warn!(username = %credentials.username, "Login failed: unknown username");
            return Err(AppError::user_not_found());
        };

        let matches = self
            .verify_password(credentials.password, user.password_hash.clone())
            .await?;
        if !matches {
            // Same error as an unknown username
            warn!(username = %credentials.username, "Login failed: wrong password");
            return Err(AppError::user_not_found());
        }

        let token = self.jwt_service.issue(&user.key())?;
        info!(user_id = %user.key(), "User logged in");

        Ok(AuthResponse {
            user: UserProfile::from(user),
            token,
        })
    }

    async fn list_users(&self) -> AppResult<Vec<UserProfile>> {
        let users = self.store.list_all().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    async fn delete_user_by_id(&self, user_id: &str) -> AppResult<UserProfile> {
        let deleted = self
            .store
            .delete_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        info!(user_id = %deleted.key(), "User deleted");
        Ok(UserProfile::from(deleted))
    }
}
