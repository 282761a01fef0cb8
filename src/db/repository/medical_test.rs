use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::db::DatabaseError;
use crate::models::MedicalTest;

use super::not_found;

const TEST_COLUMNS: &str = "id, test_code, name, short_name, description, preconditions, \
     category, subcategory, parameters, sample_type, turnaround_hours, \
     reference_range_format, units, cost";

pub fn insert_medical_test(conn: &Connection, test: &MedicalTest) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medical_tests (test_code, name, short_name, description, preconditions,
         category, subcategory, parameters, sample_type, turnaround_hours,
         reference_range_format, units, cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            test.test_code,
            test.name,
            test.short_name,
            test.description,
            test.preconditions,
            test.category,
            test.subcategory,
            test.parameters.to_string(),
            test.sample_type,
            test.turnaround_hours,
            test.reference_range_format,
            test.units,
            test.cost,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medical_test(conn: &Connection, id: i64) -> Result<Option<MedicalTest>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {TEST_COLUMNS} FROM medical_tests WHERE id = ?1"),
        params![id],
        medical_test_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Lookup by the natural key used everywhere tests are referenced.
pub fn get_medical_test_by_code(
    conn: &Connection,
    test_code: &str,
) -> Result<Option<MedicalTest>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {TEST_COLUMNS} FROM medical_tests WHERE test_code = ?1"),
        params![test_code],
        medical_test_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_medical_tests(conn: &Connection) -> Result<Vec<MedicalTest>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {TEST_COLUMNS} FROM medical_tests ORDER BY test_code"))?;
    let rows = stmt.query_map([], medical_test_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn update_medical_test(conn: &Connection, test: &MedicalTest) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medical_tests SET test_code = ?2, name = ?3, short_name = ?4, description = ?5,
         preconditions = ?6, category = ?7, subcategory = ?8, parameters = ?9,
         sample_type = ?10, turnaround_hours = ?11, reference_range_format = ?12,
         units = ?13, cost = ?14, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?1",
        params![
            test.id,
            test.test_code,
            test.name,
            test.short_name,
            test.description,
            test.preconditions,
            test.category,
            test.subcategory,
            test.parameters.to_string(),
            test.sample_type,
            test.turnaround_hours,
            test.reference_range_format,
            test.units,
            test.cost,
        ],
    )?;
    if changed == 0 {
        return Err(not_found("MedicalTest", test.id));
    }
    Ok(())
}

/// Catalog entries cannot be removed while prescribed instances reference
/// their code.
pub fn delete_medical_test(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let test = get_medical_test(conn, id)?.ok_or_else(|| not_found("MedicalTest", id))?;
    let dependents: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tests_prescribed WHERE test_code = ?1",
        params![test.test_code],
        |row| row.get(0),
    )?;
    if dependents > 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "{dependents} prescribed test(s) still reference code {}",
            test.test_code
        )));
    }
    conn.execute("DELETE FROM medical_tests WHERE id = ?1", params![id])?;
    Ok(())
}

fn medical_test_from_row(row: &Row<'_>) -> Result<MedicalTest, rusqlite::Error> {
    let parameters: String = row.get(8)?;
    Ok(MedicalTest {
        id: row.get(0)?,
        test_code: row.get(1)?,
        name: row.get(2)?,
        short_name: row.get(3)?,
        description: row.get(4)?,
        preconditions: row.get(5)?,
        category: row.get(6)?,
        subcategory: row.get(7)?,
        parameters: serde_json::from_str::<Value>(&parameters).unwrap_or(Value::Null),
        sample_type: row.get(9)?,
        turnaround_hours: row.get(10)?,
        reference_range_format: row.get(11)?,
        units: row.get(12)?,
        cost: row.get(13)?,
    })
}
