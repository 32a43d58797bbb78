//! # Store Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ──► DbError ──► ApiError::Persistence { operation, .. }    │
//! │                                                                         │
//! │  Duplicate          UNIQUE index hit (NOCASE names)       → 400         │
//! │  MissingReference   FOREIGN KEY failed                    → 500         │
//! │  RuleViolated       CHECK failed (stock >= 0, price > 0)  → 500         │
//! │  Unavailable        open failed / pool closed / timed out → 500         │
//! │  Migration, Sql, Other                                    → 500         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services validate before writing, so only `Duplicate` is expected in
//! practice: two writers racing to create the same name.

use sqlx::error::ErrorKind as SqlxErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// `column` is SQLite's `table.column` label for the violated index.
    #[error("Duplicate value for {column}")]
    Duplicate { column: String },

    #[error("Referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("Store rule violated: {0}")]
    RuleViolated(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Statement failed: {0}")]
    Sql(String),

    #[error("Store error: {0}")]
    Other(String),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::Duplicate { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    SqlxErrorKind::UniqueViolation => DbError::Duplicate {
                        // "UNIQUE constraint failed: papers.name"
                        column: message
                            .rsplit_once(": ")
                            .map(|(_, column)| column.to_string())
                            .unwrap_or(message),
                    },
                    SqlxErrorKind::ForeignKeyViolation => DbError::MissingReference(message),
                    SqlxErrorKind::CheckViolation | SqlxErrorKind::NotNullViolation => {
                        DbError::RuleViolated(message)
                    }
                    _ => DbError::Sql(message),
                }
            }
            sqlx::Error::PoolTimedOut => {
                DbError::Unavailable("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::Unavailable("pool is closed".to_string()),
            other => DbError::Other(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
