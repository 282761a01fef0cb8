use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{DatabaseError, DeletePolicy};
use crate::models::enums::DiagnosisStatus;
use crate::models::*;

use super::{enforce_delete_policy, from_json_list, not_found, to_json_list};

const DIAGNOSIS_COLUMNS: &str = "id, patient_id, doctor_id, diagnosis_date, diagnosis_time, \
     blood_pressure, blood_sugar, spo2, heart_rate, summary, requested_tests, status";

pub fn insert_diagnosis(conn: &Connection, diag: &Diagnosis) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO diagnoses (patient_id, doctor_id, diagnosis_date, diagnosis_time,
         blood_pressure, blood_sugar, spo2, heart_rate, summary, requested_tests, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            diag.patient_id,
            diag.doctor_id,
            diag.diagnosis_date,
            diag.diagnosis_time,
            diag.blood_pressure,
            diag.blood_sugar,
            diag.spo2,
            diag.heart_rate,
            diag.summary,
            to_json_list(&diag.requested_tests),
            diag.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_diagnosis(conn: &Connection, id: i64) -> Result<Option<Diagnosis>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE id = ?1"),
        params![id],
        diagnosis_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Diagnosis scoped to a patient; the pair must match.
pub fn get_diagnosis_for_patient(
    conn: &Connection,
    diagnosis_id: i64,
    patient_id: i64,
) -> Result<Option<Diagnosis>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE id = ?1 AND patient_id = ?2"),
        params![diagnosis_id, patient_id],
        diagnosis_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_diagnoses(
    conn: &Connection,
    filter: &DiagnosisFilter,
) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut sql = format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses");
    let mut clauses = Vec::new();
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(patient_id) = filter.patient_id {
        args.push(Box::new(patient_id));
        clauses.push(format!("patient_id = ?{}", args.len()));
    }
    if let Some(doctor_id) = filter.doctor_id {
        args.push(Box::new(doctor_id));
        clauses.push(format!("doctor_id = ?{}", args.len()));
    }
    if let Some(status) = filter.status {
        args.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", args.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY diagnosis_date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
        diagnosis_from_row,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Full update of the mutable diagnosis fields (the service layer merges
/// partial payloads before calling this).
pub fn update_diagnosis(conn: &Connection, diag: &Diagnosis) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE diagnoses SET diagnosis_date = ?2, diagnosis_time = ?3, blood_pressure = ?4,
         blood_sugar = ?5, spo2 = ?6, heart_rate = ?7, summary = ?8, requested_tests = ?9,
         status = ?10, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?1",
        params![
            diag.id,
            diag.diagnosis_date,
            diag.diagnosis_time,
            diag.blood_pressure,
            diag.blood_sugar,
            diag.spo2,
            diag.heart_rate,
            diag.summary,
            to_json_list(&diag.requested_tests),
            diag.status.as_str(),
        ],
    )?;
    if changed == 0 {
        return Err(not_found("Diagnosis", diag.id));
    }
    Ok(())
}

/// Delete a diagnosis together with its owned prescription, line items and
/// prescribed tests.
pub fn delete_diagnosis_cascade(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    enforce_delete_policy(conn, DeletePolicy::Cascade, "prescription_details", "diagnosis_id", id)?;
    enforce_delete_policy(conn, DeletePolicy::Cascade, "tests_prescribed", "diagnosis_id", id)?;
    enforce_delete_policy(conn, DeletePolicy::Cascade, "prescriptions", "diagnosis_id", id)?;
    let changed = conn.execute("DELETE FROM diagnoses WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("Diagnosis", id));
    }
    Ok(())
}

fn diagnosis_from_row(row: &Row<'_>) -> Result<Diagnosis, rusqlite::Error> {
    let requested: String = row.get(10)?;
    let status: String = row.get(11)?;
    Ok(Diagnosis {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        diagnosis_date: row.get(3)?,
        diagnosis_time: row.get(4)?,
        blood_pressure: row.get(5)?,
        blood_sugar: row.get(6)?,
        spo2: row.get(7)?,
        heart_rate: row.get(8)?,
        summary: row.get(9)?,
        requested_tests: from_json_list(&requested),
        status: DiagnosisStatus::from_str(&status).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                format!("unknown diagnosis status: {status}").into(),
            )
        })?,
    })
}
