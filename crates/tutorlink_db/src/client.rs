//! Database client for Tutorlink
//!
//! A thin wrapper around an `sqlx::Any` pool. The concrete backend (SQLite by
//! default, PostgreSQL with the `postgres` feature) is picked from the URL.

use crate::error::DbError;
use sqlx::pool::PoolOptions;
use sqlx::{Pool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tutorlink_config::{AppConfig, DatabaseConfig};

/// Type alias for a database transaction
pub type DbTransaction<'a> = Transaction<'a, sqlx::Any>;

/// SQL flavour behind the `Any` pool. Only DDL differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else if db_url.starts_with("postgres:") || db_url.starts_with("postgresql:") {
            Ok(Dialect::Postgres)
        } else {
            Err(DbError::UrlError(format!(
                "Unsupported database URL scheme: {}",
                db_url
            )))
        }
    }

    /// Column definition for an auto-incrementing 64-bit primary key.
    pub fn serial_primary_key(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbClient {
    pool: Pool<sqlx::Any>,
    dialect: Dialect,
}

impl DbClient {
    /// Creates a client from the `[database]` section of the application config.
    pub async fn new(config: &Arc<AppConfig>) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;

        Self::from_config(db_config).await
    }

    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }
        Self::from_url(&db_config.url).await
    }

    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }
        let dialect = Dialect::from_url(db_url)?;
        let pool = Self::create_pool(db_url, dialect).await?;
        Ok(Self { pool, dialect })
    }

    async fn create_pool(db_url: &str, dialect: Dialect) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating database pool with URL: {}", db_url);

        sqlx::any::install_default_drivers();

        let in_memory = dialect == Dialect::Sqlite && db_url.contains(":memory:");

        // Every in-memory SQLite connection is its own database, so the pool
        // must hold exactly one connection and never recycle it.
        let pool_options = if in_memory {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(Duration::from_secs(600))
        };

        if dialect == Dialect::Sqlite && !in_memory {
            Self::ensure_sqlite_file(db_url)?;
        }

        let connect_options = sqlx::any::AnyConnectOptions::from_str(db_url)
            .map_err(|e| DbError::UrlError(e.to_string()))?;

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully ({:?})", dialect);
        Ok(pool)
    }

    /// `AnyConnectOptions` has no `create_if_missing`, so the file and its
    /// directory are created up front.
    fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        // Drop query parameters such as ?mode=rwc
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        if db_path.is_empty() {
            return Ok(());
        }

        let path = Path::new(db_path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!("Creating directory for SQLite database: {:?}", dir);
                std::fs::create_dir_all(dir).map_err(|e| {
                    error!("Failed to create directory for SQLite database: {}", e);
                    DbError::PoolError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        if !path.exists() {
            debug!("Creating empty SQLite database file: {}", db_path);
            std::fs::File::create(path).map_err(|e| {
                error!("Failed to create SQLite database file: {}", e);
                DbError::PoolError(format!("Failed to create database file: {}", e))
            })?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub async fn begin(&self) -> Result<DbTransaction<'static>, DbError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    /// Executes a statement that returns no rows. Returns the affected row count.
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient({:?})", self.dialect)
    }
}
