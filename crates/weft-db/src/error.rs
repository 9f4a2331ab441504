//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! SQLite Error (sqlx::Error)
//!      │
//!      ▼
//! DbError (this module)  ← adds context and the conflict taxonomy
//!      │
//!      ▼
//! Caller (the surrounding ERP) maps kinds to user-facing responses
//! ```
//!
//! Every variant is detected synchronously inside the owning transaction and
//! causes an immediate rollback; partial writes are never committed.

use thiserror::Error;
use weft_core::CoreError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Referenced entity does not exist.
    ///
    /// ## When This Occurs
    /// - An issue line references an unknown weightment id
    /// - A replace targets a lot that was never created
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate document number or code).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A weightment referenced by an allocation is already consumed.
    ///
    /// The whole batch is rejected; no line of the issue is persisted.
    #[error("Weightment {bale_no} is already issued")]
    AlreadyIssued { bale_no: String },

    /// A whole-set weightment replace (or lot delete) hit a lot with issued
    /// bales; nothing was deleted.
    #[error("Lot {lot_no} has {issued} issued bale(s); set can no longer be replaced")]
    IssuedBalesPresent { lot_no: String, issued: i64 },

    /// Deleting an issue that has allocation lines is forbidden; allocation
    /// is a physical consumption event and is not reversed by deletes.
    #[error("Issue {issue_no} has {items} item(s) and cannot be deleted")]
    IssueHasItems { issue_no: String, items: i64 },

    /// Reconciliation or validation failure surfaced from weft-core inside a
    /// database operation.
    #[error(transparent)]
    Core(#[from] CoreError),

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

    /// Whether this error is one of the conflict kinds (duplicate number,
    /// already-issued weightment, blocked replace/delete).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::AlreadyIssued { .. }
                | DbError::IssuedBalesPresent { .. }
                | DbError::IssueHasItems { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → analyze message for constraint type
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

                // SQLite constraint messages:
                // UNIQUE:      "UNIQUE constraint failed: <table>.<column>"
                // FOREIGN KEY: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        assert!(DbError::AlreadyIssued {
            bale_no: "UC/24-25/0001-01".to_string()
        }
        .is_conflict());
        assert!(DbError::duplicate("lots.lot_no", "UC/24-25/0001").is_conflict());
        assert!(!DbError::not_found("Weightment", "w-1").is_conflict());
    }

    #[test]
    fn test_error_messages() {
        let err = DbError::AlreadyIssued {
            bale_no: "UC/24-25/0001-02".to_string(),
        };
        assert_eq!(err.to_string(), "Weightment UC/24-25/0001-02 is already issued");

        let err = DbError::IssuedBalesPresent {
            lot_no: "UC/24-25/0007".to_string(),
            issued: 3,
        };
        assert_eq!(
            err.to_string(),
            "Lot UC/24-25/0007 has 3 issued bale(s); set can no longer be replaced"
        );
    }
}
