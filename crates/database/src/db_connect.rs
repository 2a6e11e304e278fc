use anyhow::Context;
use app_config::SurrealDbConfig;
use app_error::{AppError, AppErrorExt, AppResult};
use std::{fmt, sync::Arc, time::Duration};
use surrealdb::{Surreal, engine::any::Any, opt::auth::Root};
use tokio::time::timeout;

use crate::Database;

const MEMORY_ENDPOINT: &str = "memory";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct DbCredentials {
    username: String,
    password: String,
}

impl DbCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }
}

// Don't accidentally log credentials
impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn is_memory_endpoint(endpoint: &str) -> bool {
    endpoint == MEMORY_ENDPOINT || endpoint.starts_with("mem://")
}

async fn open_client(endpoint: &str, connect_timeout: Duration) -> AppResult<Surreal<Any>> {
    match timeout(connect_timeout, surrealdb::engine::any::connect(endpoint)).await {
        Ok(result) => result
            .with_context(|| format!("Failed to connect to database at {}", endpoint))
            .storage_err(),
        Err(_) => Err(AppError::StorageError(anyhow::anyhow!(
            "Database connection timeout - could not connect within {:?}",
            connect_timeout
        ))),
    }
}

impl Database {
    /// Connect, sign in as root and select the namespace/database.
    pub async fn connect(
        endpoint: &str,
        namespace: &str,
        database: &str,
        credentials: &DbCredentials,
        connect_timeout: Duration,
    ) -> AppResult<Self> {
        if namespace.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Database namespace cannot be empty".into(),
            ));
        }

        if database.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Database name cannot be empty".into(),
            ));
        }

        if endpoint.starts_with("wss://") {
            tracing::info!("Using secure TLS connection to database");
        } else if !is_memory_endpoint(endpoint) {
            tracing::warn!("Using non-secure database connection");
        }

        let client = open_client(endpoint, connect_timeout).await?;

        if !is_memory_endpoint(endpoint) {
            client
                .signin(Root {
                    username: credentials.get_username(),
                    password: credentials.get_password(),
                })
                .await
                .context("Failed to authenticate with database")
                .storage_err()?;
        }

        client
            .use_ns(namespace)
            .use_db(database)
            .await
            .context("Failed to select namespace and database")
            .storage_err()?;

        Ok(Self { client })
    }

    /// Fresh in-memory datastore; every call yields an isolated instance.
    pub async fn memory(namespace: &str, database: &str) -> AppResult<Self> {
        let credentials = DbCredentials::new("root", "root");
        Self::connect(
            MEMORY_ENDPOINT,
            namespace,
            database,
            &credentials,
            DEFAULT_CONNECT_TIMEOUT,
        )
        .await
    }

    pub async fn health(&self) -> AppResult<()> {
        self.client
            .health()
            .await
            .context("Database health check failed")
            .storage_err()
    }
}

pub async fn initialize_user_db(db_config: &SurrealDbConfig) -> AppResult<Arc<Database>> {
    tracing::debug!("Connecting to SurrealDB: {}", db_config.endpoint);

    let credentials = DbCredentials::new(db_config.username.clone(), db_config.password.clone());

    let db = Database::connect(
        &db_config.endpoint,
        &db_config.namespace,
        &db_config.database,
        &credentials,
        db_config.connection_timeout(),
    )
    .await?;

    tracing::info!("Successfully connected to user SurrealDB");

    Ok(Arc::new(db))
}

pub async fn initialize_memory_db() -> AppResult<Arc<Database>> {
    let db = Database::memory("test_namespace", "test_database").await?;

    tracing::info!("Successfully connected to in-memory SurrealDB");

    Ok(Arc::new(db))
}
