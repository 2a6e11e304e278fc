use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, time::Duration};
use tracing::{debug, info, warn};

use app_error::{AppError, AppResult};

const BUNDLED_CONFIG: &str = include_str!("../res/app-config.json");

/// Environment variable pointing at an alternative JSON configuration file
pub const CONFIG_PATH_ENV: &str = "APP_CONFIG_PATH";

/// Longest accepted token lifetime (30 days)
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 30;

/// Complete application configuration loaded from JSON file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database: DatabasesConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabasesConfig {
    pub user_db: SurrealDbConfig,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct SurrealDbConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    /// Milliseconds
    pub connection_timeout: u64,
}

impl SurrealDbConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout)
    }
}

// Don't accidentally log credentials
impl fmt::Debug for SurrealDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurrealDbConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Milliseconds
    pub request_timeout: u64,
    pub body_limit: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub password: PasswordConfig,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: u64,
    pub algorithm: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expiry_hours", &self.expiry_hours)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PasswordConfig {
    pub argon2: Argon2Config,
}

/// Argon2id cost parameters. `memory` is in KiB.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Argon2Config {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub sentry: SentryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SentryConfig {
    pub dsn: String,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Configuration loaded from file");
        Ok(config)
    }

    /// Load the configuration file (or the bundled one), apply environment
    /// overrides and validate the result.
    pub fn load() -> AppResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path).map_err(AppError::ConfigError)?,
            Err(_) => match serde_json::from_str::<AppConfig>(BUNDLED_CONFIG) {
                Ok(conf) => conf,
                Err(e) => {
                    warn!(
                        "Failed to parse bundled config: {}. Using default configuration.",
                        e
                    );
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        info!("Loaded configuration for environment: {}", config.environment);

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("APP_ENVIRONMENT") {
            self.environment = value;
        }
        if let Some(value) = lookup("SERVER_HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("SERVER_PORT") {
            self.server.port = parse_override("SERVER_PORT", &value)?;
        }
        if let Some(value) = lookup("JWT_SECRET") {
            self.security.jwt.secret = value;
        }
        if let Some(value) = lookup("JWT_EXPIRY_HOURS") {
            self.security.jwt.expiry_hours = parse_override("JWT_EXPIRY_HOURS", &value)?;
        }

        let db = &mut self.database.user_db;
        if let Some(value) = lookup("DB_ENDPOINT") {
            db.endpoint = value;
        }
        if let Some(value) = lookup("DB_NAMESPACE") {
            db.namespace = value;
        }
        if let Some(value) = lookup("DB_NAME") {
            db.database = value;
        }
        if let Some(value) = lookup("SURREALDB_USERNAME") {
            db.username = value;
        }
        if let Some(value) = lookup("SURREALDB_PASSWORD") {
            db.password = value;
        }

        if let Some(value) = lookup("LOG_LEVEL") {
            self.monitoring.logging.level = value;
        }
        if let Some(value) = lookup("SENTRY_DSN") {
            self.monitoring.sentry.dsn = value;
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        let is_production = self.is_production();

        self.validate_database_config(&self.database.user_db, "user_db", is_production, &mut errors);

        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        let jwt = &self.security.jwt;
        if jwt.secret.is_empty() {
            errors.push("JWT secret cannot be empty".to_string());
        } else if is_production && jwt.secret.len() < 32 {
            errors.push("JWT secret is not secure for production use".to_string());
        }

        if jwt.expiry_hours == 0 {
            errors.push("JWT expiry must be at least one hour".to_string());
        } else if jwt.expiry_hours > MAX_JWT_EXPIRY_HOURS {
            errors.push(format!(
                "JWT expiry cannot exceed {} hours",
                MAX_JWT_EXPIRY_HOURS
            ));
        }

        if jwt.algorithm != "HS256" {
            errors.push(format!("Unsupported JWT algorithm '{}'", jwt.algorithm));
        }

        let argon2 = &self.security.password.argon2;
        if argon2.iterations == 0 || argon2.parallelism == 0 {
            errors.push("Argon2 iterations and parallelism must be positive".to_string());
        }
        if argon2.memory < 8 * argon2.parallelism {
            errors.push("Argon2 memory must be at least 8 KiB per lane".to_string());
        }

        if is_production && self.monitoring.sentry.dsn.trim().is_empty() {
            errors.push("Sentry DSN should be configured in production".to_string());
        }

        if !errors.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid configuration: {}",
                errors.join(", ")
            )));
        }
        Ok(())
    }

    /// Helper function to validate individual database configs
    fn validate_database_config(
        &self,
        db_config: &SurrealDbConfig,
        db_name: &str,
        is_production: bool,
        errors: &mut Vec<String>,
    ) {
        if db_config.endpoint.trim().is_empty() {
            errors.push(format!("{} endpoint cannot be empty", db_name));
        } else if is_production
            && !db_config.endpoint.starts_with("wss://")
            && !db_config.endpoint.starts_with("mem")
        {
            errors.push(format!(
                "{} should use a secure 'wss://' database connection in production",
                db_name
            ));
        }

        if db_config.namespace.trim().is_empty() {
            errors.push(format!("{} namespace cannot be empty", db_name));
        }

        if db_config.database.trim().is_empty() {
            errors.push(format!("{} database name cannot be empty", db_name));
        }

        if is_production {
            if db_config.username == "root" {
                errors.push(format!(
                    "Using default 'root' username in {} in production is insecure",
                    db_name
                ));
            }

            if db_config.password == "root" {
                errors.push(format!(
                    "Using default 'root' password in {} in production is insecure",
                    db_name
                ));
            }
        }
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value '{}' for {}", value, key))
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: DatabasesConfig {
                user_db: SurrealDbConfig {
                    endpoint: "ws://localhost:8000".to_string(),
                    username: "root".to_string(),
                    password: "root".to_string(),
                    namespace: "accounts".to_string(),
                    database: "users".to_string(),
                    connection_timeout: 5000,
                },
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout: 30000,
                body_limit: 1048576, // 1MB
            },
            security: SecurityConfig {
                jwt: JwtConfig {
                    secret: "default-insecure-jwt-secret-do-not-use-in-production".to_string(),
                    expiry_hours: 24,
                    algorithm: "HS256".to_string(),
                },
                cors: CorsConfig {
                    allowed_origins: vec!["*".to_string()],
                    allowed_methods: vec![
                        "GET".to_string(),
                        "POST".to_string(),
                        "DELETE".to_string(),
                        "OPTIONS".to_string(),
                    ],
                    allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
                },
                password: PasswordConfig {
                    argon2: Argon2Config {
                        memory: 19456,
                        iterations: 2,
                        parallelism: 1,
                    },
                },
            },
            monitoring: MonitoringConfig {
                sentry: SentryConfig {
                    dsn: "".to_string(),
                    sample_rate: 1.0,
                    traces_sample_rate: 0.2,
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                    format: "plain".to_string(),
                },
            },
        }
    }
}
