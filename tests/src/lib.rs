//! Harness for end-to-end tests: the full router over an in-memory SurrealDB.

use app_config::{AppConfig, Argon2Config};
use app_database::{Database, SurrealUserStore, db_connect::initialize_memory_db};
use app_error::AppResult;
use app_middleware::{CredentialHasher, JwtService};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use micro_user::{routes::create_routes, service::AccountService, state::AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &[u8] = b"test_secret_key_for_system_testing_only";

pub struct TestApp {
    pub router: Router,
    pub db: Arc<Database>,
    pub jwt_service: Arc<JwtService>,
}

impl TestApp {
    /// Every call gets its own isolated in-memory datastore.
    pub async fn spawn() -> AppResult<Self> {
        let config = AppConfig::default();
        let db = initialize_memory_db().await?;
        let store = Arc::new(SurrealUserStore::new(Arc::clone(&db)).await?);

        // Cheap cost parameters keep the suite fast
        let hasher = Arc::new(CredentialHasher::new(&Argon2Config {
            memory: 64,
            iterations: 1,
            parallelism: 1,
        })?);
        let jwt_service = Arc::new(JwtService::new(TEST_JWT_SECRET, 1));

        let accounts = Arc::new(AccountService::new(
            store,
            hasher,
            Arc::clone(&jwt_service),
        ));
        let router = create_routes(AppState::new(accounts, Arc::clone(&jwt_service)), &config);

        Ok(Self {
            router,
            db,
            jwt_service,
        })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("valid request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
