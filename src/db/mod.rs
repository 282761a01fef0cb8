pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}

/// What happens to dependents when a referenced row is deleted.
///
/// Every relationship carries one of these explicitly instead of relying
/// on per-column schema defaults; `repository::enforce_delete_policy`
/// applies the choice before the delete statement runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Reject the delete while dependents exist.
    Restrict,
    /// Null out the referencing column.
    Nullify,
    /// Delete the dependents along with the parent.
    Cascade,
}
