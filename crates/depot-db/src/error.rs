//! # Database Error Types
//!
//! Error types for ledger store and engine operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (depot-core)            │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← categorized: NotFound, ConcurrencyConflict,   │
//! │       │                   Domain(InsufficientStock, ...), ...          │
//! │       ▼                                                                 │
//! │  Caller (receiving / picking / relocation) ← user-facing message       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `ConcurrencyConflict` is never retried inside the engine. The caller
//! re-reads and decides, so a business-rule race is not hidden behind a
//! silent technical retry.

use thiserror::Error;

use depot_core::{CoreError, ValidationError};

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Line / assignment id doesn't exist
    /// - Line was retired (soft-deleted)
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Business rule violation raised by depot-core.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Another writer touched the same row first.
    ///
    /// ## When This Occurs
    /// - SQLite reports the database as locked/busy for our write
    /// - A versioned counter update matched zero rows
    /// - Two creators raced for the same inventory number
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Ledger entry referencing a non-existent line
    /// - Assignment referencing a non-existent line
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a ConcurrencyConflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        DbError::ConcurrencyConflict(message.into())
    }

    /// True for errors the caller should retry with fresh data.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::ConcurrencyConflict(_))
    }

    /// The wrapped business error, if any.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            DbError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// SQLite primary/extended result codes meaning "someone else holds the lock".
///
/// 5 BUSY, 6 LOCKED, 261 BUSY_RECOVERY, 262 LOCKED_SHAREDCACHE,
/// 517 BUSY_SNAPSHOT, 773 BUSY_TIMEOUT
const SQLITE_CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517", "773"];

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → contention / constraint / query failure
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let code = db_err.code();

                let contended = code
                    .as_deref()
                    .is_some_and(|c| SQLITE_CONTENTION_CODES.contains(&c))
                    || msg.contains("database is locked")
                    || msg.contains("database table is locked");

                if contended {
                    DbError::ConcurrencyConflict(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
