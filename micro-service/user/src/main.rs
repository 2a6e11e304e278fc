use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use app_config::{AppConfig, LoggingConfig, SentryConfig, load_env};
use app_database::{SurrealUserStore, db_connect::initialize_user_db};
use app_error::AppError;
use app_middleware::{CredentialHasher, JwtService};
use micro_user::{routes, service::AccountService, state::AppState};

fn init_sentry(config: &SentryConfig, environment: &str) -> Option<sentry::ClientInitGuard> {
    if config.dsn.trim().is_empty() {
        return None;
    }

    Some(sentry::init((
        config.dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(environment.to_string().into()),
            sample_rate: config.sample_rate,
            traces_sample_rate: config.traces_sample_rate,
            ..Default::default()
        },
    )))
}

fn init_tracing(config: &LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let use_json = config.format.eq_ignore_ascii_case("json");
    let json_layer = use_json.then(|| fmt::layer().json());
    let plain_layer = (!use_json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .with(sentry_tracing::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A missing .env is fine, the environment may already be populated
    let env_loaded = load_env(".env");

    let config = AppConfig::load()?;

    let _sentry_guard = init_sentry(&config.monitoring.sentry, &config.environment);
    init_tracing(&config.monitoring.logging);

    if let Err(e) = env_loaded {
        warn!("No .env file loaded: {}", e);
    }

    info!("Starting application at {}", chrono::Utc::now());

    let jwt_service = Arc::new(JwtService::from_config(&config.security.jwt)?);
    let hasher = Arc::new(CredentialHasher::new(&config.security.password.argon2)?);

    let db = initialize_user_db(&config.database.user_db).await?;
    let store = Arc::new(SurrealUserStore::new(db).await?);

    let accounts = Arc::new(AccountService::new(store, hasher, Arc::clone(&jwt_service)));
    let state = AppState::new(accounts, jwt_service);

    let app = routes::create_routes(state, &config);

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to address: {}", address))?;

    info!("Server listening on http://{}", address);

    routes::serve(listener, app, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
