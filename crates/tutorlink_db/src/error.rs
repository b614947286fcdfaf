//! Error types for the database layer

use thiserror::Error;
use tutorlink_common::{HttpStatusCode, TutorlinkError};

/// Errors that can occur when working with the database
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A stored value could not be decoded into the domain type
    #[error("Corrupt row: {0}")]
    DecodeError(String),

    /// The row the operation targets does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The row exists but its state does not allow the operation
    #[error("{0}")]
    Conflict(String),
}

impl HttpStatusCode for DbError {
    fn status_code(&self) -> u16 {
        match self {
            DbError::NotFound(_) => 404,
            DbError::Conflict(_) => 409,
            _ => 500,
        }
    }
}

impl From<DbError> for TutorlinkError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => TutorlinkError::NotFoundError(what),
            DbError::Conflict(msg) => TutorlinkError::ConflictError(msg),
            DbError::ConfigError(msg) => TutorlinkError::ConfigError(msg),
            other => TutorlinkError::DatabaseError(other.to_string()),
        }
    }
}
