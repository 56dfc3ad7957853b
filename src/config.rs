use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://hospital_inventory.db?mode=rwc";
const CONFIG_DIR: &str = "config";
const DEFAULT_SESSION_ISSUER: &str = "hospital-inventory-auth";
const DEFAULT_SESSION_AUDIENCE: &str = "hospital-inventory-api";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// HMAC secret used to verify session tokens
    #[validate(length(min = 32))]
    pub session_secret: String,

    /// Expected `iss` claim of session tokens
    #[serde(default = "default_session_issuer")]
    pub session_issuer: String,

    /// Expected `aud` claim of session tokens
    #[serde(default = "default_session_audience")]
    pub session_audience: String,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,
}

impl AppConfig {
    pub fn new(
        database_url: String,
        session_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            session_secret,
            session_issuer: default_session_issuer(),
            session_audience: default_session_audience(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        matches!(
            self.environment.to_ascii_lowercase().as_str(),
            "development" | "dev" | "local" | "test"
        )
    }

    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.cors_allow_any_origin || self.is_development()
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.is_development() && !self.has_cors_allowed_origins() && !self.cors_allow_any_origin
        {
            let mut err = ValidationError::new("cors_allowed_origins");
            err.message = Some(
                "cors_allowed_origins must be set outside development (or set cors_allow_any_origin)"
                    .into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections cannot exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Runs both the derived field rules and the cross-field checks.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        self.validate_additional_constraints()
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_session_issuer() -> String {
    DEFAULT_SESSION_ISSUER.to_string()
}

fn default_session_audience() -> String {
    DEFAULT_SESSION_AUDIENCE.to_string()
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("hospital_inventory_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::try_new(filter_directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    if let Err(err) = result {
        eprintln!("tracing subscriber already installed: {}", err);
    }
}

/// Loads configuration from defaults, `config/` files and `APP__*` variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // session_secret has no default: it must come from a file or APP__SESSION_SECRET.
    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("session_secret").is_err() {
        error!("Session secret is not configured. Set APP__SESSION_SECRET (minimum 32 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "session_secret is required but not configured. Set APP__SESSION_SECRET.".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate_all().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
