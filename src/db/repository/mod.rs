//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per entity family. All public functions are re-exported
//! here; every function takes an explicit `&Connection` so callers can run
//! them inside their own transactions.

mod allotment;
mod department;
mod diagnosis;
mod doctor;
mod medical_test;
mod patient;
mod prescription;
mod test_prescribed;
mod ward;

use rusqlite::{params, Connection};

use super::{DatabaseError, DeletePolicy};

pub use allotment::*;
pub use department::*;
pub use diagnosis::*;
pub use doctor::*;
pub use medical_test::*;
pub use patient::*;
pub use prescription::*;
pub use test_prescribed::*;
pub use ward::*;

/// Apply the declared deletion policy for one relationship before the
/// parent row is removed. `Restrict` fails while dependents exist;
/// `Nullify`/`Cascade` rewrite the dependents.
pub(crate) fn enforce_delete_policy(
    conn: &Connection,
    policy: DeletePolicy,
    dependent_table: &str,
    fk_column: &str,
    parent_id: i64,
) -> Result<(), DatabaseError> {
    match policy {
        DeletePolicy::Restrict => {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {dependent_table} WHERE {fk_column} = ?1"),
                params![parent_id],
                |row| row.get(0),
            )?;
            if count > 0 {
                return Err(DatabaseError::ConstraintViolation(format!(
                    "{count} row(s) in {dependent_table} still reference id {parent_id}"
                )));
            }
            Ok(())
        }
        DeletePolicy::Nullify => {
            conn.execute(
                &format!("UPDATE {dependent_table} SET {fk_column} = NULL WHERE {fk_column} = ?1"),
                params![parent_id],
            )?;
            Ok(())
        }
        DeletePolicy::Cascade => {
            conn.execute(
                &format!("DELETE FROM {dependent_table} WHERE {fk_column} = ?1"),
                params![parent_id],
            )?;
            Ok(())
        }
    }
}

/// Serialize a string list for a JSON-array column.
pub(crate) fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

/// Deserialize a JSON-array column, tolerating legacy empty values.
pub(crate) fn from_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub(crate) fn not_found(entity_type: &str, id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: entity_type.into(),
        id: id.to_string(),
    }
}
