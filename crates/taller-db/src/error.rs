//! # Catalog Storage Errors
//!
//! `sqlx::Error` is folded into [`DbError`] here, and `DbError` into the
//! [`CatalogError`] categories the purchase editor can react to:
//!
//! ```text
//!   sqlx::Error ──► DbError ──► CatalogError ──► EditorNotice::CatalogCreationFailed
//! ```

use taller_core::{CatalogError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Raised for a second active product with the same name, compared
    /// case-insensitively.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Input or stored data failed domain validation.
    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            // SQLite reports "UNIQUE constraint failed: products.name"
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let field = db_err
                    .message()
                    .rsplit(": ")
                    .next()
                    .unwrap_or("unknown")
                    .to_string();
                DbError::UniqueViolation {
                    field,
                    value: "unknown".to_string(),
                }
            }
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Catalog callers only see the categories they can act on.
impl From<DbError> for CatalogError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(e) => CatalogError::CreationFailed(e.to_string()),
            DbError::UniqueViolation { field, value } => {
                CatalogError::CreationFailed(format!("duplicate {}: '{}'", field, value))
            }
            DbError::PoolExhausted => CatalogError::TimedOut,
            other => CatalogError::Unavailable(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
