use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::enums::TestStatus;
use crate::models::TestPrescribed;

use super::not_found;

const TEST_PRESCRIBED_COLUMNS: &str = "id, test_code, diagnosis_id, prescription_id, \
     patient_id, doctor_id, test_date, test_time, results, result_file, comments, status";

pub fn insert_test_prescribed(
    conn: &Connection,
    test: &TestPrescribed,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO tests_prescribed (test_code, diagnosis_id, prescription_id, patient_id,
         doctor_id, test_date, test_time, results, result_file, comments, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            test.test_code,
            test.diagnosis_id,
            test.prescription_id,
            test.patient_id,
            test.doctor_id,
            test.test_date,
            test.test_time,
            test.results,
            test.result_file,
            test.comments,
            test.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_test_prescribed(
    conn: &Connection,
    id: i64,
) -> Result<Option<TestPrescribed>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {TEST_PRESCRIBED_COLUMNS} FROM tests_prescribed WHERE id = ?1"),
        params![id],
        test_prescribed_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_tests_for_diagnosis(
    conn: &Connection,
    diagnosis_id: i64,
) -> Result<Vec<TestPrescribed>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEST_PRESCRIBED_COLUMNS} FROM tests_prescribed
         WHERE diagnosis_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![diagnosis_id], test_prescribed_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Attach results and move the test to its new status in one statement.
pub fn set_test_results(
    conn: &Connection,
    id: i64,
    results: &str,
    result_file: Option<&str>,
    status: TestStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE tests_prescribed SET results = ?2, result_file = ?3, status = ?4,
         updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id, results, result_file, status.as_str()],
    )?;
    if changed == 0 {
        return Err(not_found("TestPrescribed", id));
    }
    Ok(())
}

pub fn set_test_status(
    conn: &Connection,
    id: i64,
    status: TestStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE tests_prescribed SET status = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    if changed == 0 {
        return Err(not_found("TestPrescribed", id));
    }
    Ok(())
}

fn test_prescribed_from_row(row: &Row<'_>) -> Result<TestPrescribed, rusqlite::Error> {
    let status: String = row.get(11)?;
    Ok(TestPrescribed {
        id: row.get(0)?,
        test_code: row.get(1)?,
        diagnosis_id: row.get(2)?,
        prescription_id: row.get(3)?,
        patient_id: row.get(4)?,
        doctor_id: row.get(5)?,
        test_date: row.get(6)?,
        test_time: row.get(7)?,
        results: row.get(8)?,
        result_file: row.get(9)?,
        comments: row.get(10)?,
        status: TestStatus::from_str(&status).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                format!("unknown test status: {status}").into(),
            )
        })?,
    })
}
