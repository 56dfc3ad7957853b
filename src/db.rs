use crate::config::AppConfig;
use crate::errors::{AppError, ServiceError};
use metrics::{counter, gauge};
use once_cell::sync::Lazy;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns an `AppError` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, AppError> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("hospital_inventory_db.max_connections", config.max_connections as f64);

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "Database connection establishment failed");
        counter!("hospital_inventory_db.connection_failures", 1);
        AppError::DatabaseError(e)
    })?;

    info!("Database connection pool established successfully");
    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, AppError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Runs database migrations
///
/// # Errors
/// Returns an `AppError` if migrations fail to execute
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(AppError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), AppError> {
    let start = std::time::Instant::now();
    let result = pool.ping().await.map_err(AppError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            gauge!(
                "hospital_inventory_db.connection_latency",
                elapsed.as_millis() as f64
            );
        }
        Err(e) => {
            error!("Database connection check failed after {:?}: {}", elapsed, e);
            counter!("hospital_inventory_db.connection_failures", 1);
        }
    }

    result
}

/// Closes the database connection pool
pub async fn close_pool(pool: DbPool) -> Result<(), AppError> {
    info!("Closing database connection pool");
    pool.close().await.map_err(AppError::DatabaseError)
}

/// Process-wide pool handle. Empty until first use and after teardown.
static GLOBAL_POOL: Lazy<Mutex<Option<Arc<DbPool>>>> = Lazy::new(|| Mutex::new(None));

/// Returns the shared pool, connecting (and migrating when `auto_migrate`
/// is set) on the first call.
pub async fn global_pool(cfg: &AppConfig) -> Result<Arc<DbPool>, AppError> {
    let mut slot = GLOBAL_POOL.lock().await;
    if let Some(pool) = slot.as_ref() {
        return Ok(pool.clone());
    }

    let pool = establish_connection_from_app_config(cfg).await?;
    if cfg.auto_migrate {
        run_migrations(&pool).await?;
    }

    let pool = Arc::new(pool);
    *slot = Some(pool.clone());
    Ok(pool)
}

/// Releases the shared pool. Callers must drop their own clones first for
/// the connections to be closed gracefully.
pub async fn shutdown_global_pool() -> Result<(), AppError> {
    let taken = GLOBAL_POOL.lock().await.take();
    let Some(pool) = taken else {
        debug!("No global database pool to shut down");
        return Ok(());
    };

    match Arc::try_unwrap(pool) {
        Ok(pool) => close_pool(pool).await,
        Err(shared) => {
            warn!(
                outstanding = Arc::strong_count(&shared) - 1,
                "Database pool still referenced at shutdown; dropping handle"
            );
            Err(ServiceError::InternalError(
                "database pool still in use at shutdown".to_string(),
            ))
        }
    }
}
