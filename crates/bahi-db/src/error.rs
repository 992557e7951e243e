//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       │   bill number allocation failures are re-tagged                │
//! │       │   as DbError::Sequencing by the bill repository                │
//! │       ▼                                                                 │
//! │  ApiError (in bahi-api) ← { error, code } JSON body                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a stock item with an existing ID
    /// - A bill number issued twice for one tenant
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The bill number could not be allocated or was already taken.
    ///
    /// The commit that hit this wrote nothing. It is not retried.
    #[error("Bill number allocation failed: {0}")]
    Sequencing(String),

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

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Re-tags any failure as a sequencing failure.
    pub fn into_sequencing(self) -> Self {
        match self {
            DbError::Sequencing(_) => self,
            other => DbError::Sequencing(other.to_string()),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// RowNotFound                        → DbError::NotFound
/// Database, kind UniqueViolation     → DbError::UniqueViolation (columns from the message)
/// Database, kind ForeignKeyViolation → DbError::ForeignKeyViolation
/// Database, any other kind           → DbError::QueryFailed
/// PoolTimedOut / PoolClosed          → DbError::PoolExhausted / ConnectionFailed
/// Other                              → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    DbError::duplicate(violated_columns(db_err.message()), "unknown")
                }
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

/// `"UNIQUE constraint failed: bills.tenant_id, bills.bill_no"` → `"bills.tenant_id, bills.bill_no"`
fn violated_columns(message: &str) -> String {
    message
        .split_once("constraint failed: ")
        .map(|(_, columns)| columns)
        .unwrap_or("unknown")
        .to_string()
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(format!("JSON encoding failed: {}", err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violated_columns() {
        assert_eq!(
            violated_columns("UNIQUE constraint failed: bills.tenant_id, bills.bill_no"),
            "bills.tenant_id, bills.bill_no"
        );
        assert_eq!(violated_columns("something else"), "unknown");
    }

    #[test]
    fn test_into_sequencing() {
        let err = DbError::duplicate("bills.tenant_id, bills.bill_no", "INV-0001").into_sequencing();
        assert!(matches!(err, DbError::Sequencing(msg) if msg.contains("INV-0001")));

        let err = DbError::Sequencing("boom".into()).into_sequencing();
        assert_eq!(err.to_string(), "Bill number allocation failed: boom");
    }
}
