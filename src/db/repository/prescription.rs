use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{DatabaseError, DeletePolicy};
use crate::models::enums::PrescriptionStatus;
use crate::models::*;

use super::{enforce_delete_policy, not_found};

const PRESCRIPTION_COLUMNS: &str =
    "id, diagnosis_id, patient_id, doctor_id, prescription_date, notes, status";

pub fn insert_prescription(
    conn: &Connection,
    prescription: &Prescription,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (diagnosis_id, patient_id, doctor_id, prescription_date,
         notes, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            prescription.diagnosis_id,
            prescription.patient_id,
            prescription.doctor_id,
            prescription.prescription_date,
            prescription.notes,
            prescription.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_prescription(
    conn: &Connection,
    id: i64,
) -> Result<Option<Prescription>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?1"),
        params![id],
        prescription_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// The at-most-one prescription attached to a diagnosis.
pub fn get_prescription_for_diagnosis(
    conn: &Connection,
    diagnosis_id: i64,
) -> Result<Option<Prescription>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE diagnosis_id = ?1"),
        params![diagnosis_id],
        prescription_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn set_prescription_status(
    conn: &Connection,
    id: i64,
    status: PrescriptionStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE prescriptions SET status = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    if changed == 0 {
        return Err(not_found("Prescription", id));
    }
    Ok(())
}

/// Delete a prescription and its line items.
pub fn delete_prescription_cascade(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    enforce_delete_policy(conn, DeletePolicy::Cascade, "prescription_details", "prescription_id", id)?;
    enforce_delete_policy(conn, DeletePolicy::Nullify, "tests_prescribed", "prescription_id", id)?;
    let changed = conn.execute("DELETE FROM prescriptions WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("Prescription", id));
    }
    Ok(())
}

pub fn insert_prescription_detail(
    conn: &Connection,
    detail: &PrescriptionDetail,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO prescription_details (prescription_id, diagnosis_id, patient_id,
         doctor_id, drug, dosage, frequency, duration)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            detail.prescription_id,
            detail.diagnosis_id,
            detail.patient_id,
            detail.doctor_id,
            detail.drug,
            detail.dosage,
            detail.frequency,
            detail.duration,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_prescription_details(
    conn: &Connection,
    prescription_id: i64,
) -> Result<Vec<PrescriptionDetail>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, prescription_id, diagnosis_id, patient_id, doctor_id, drug, dosage,
         frequency, duration
         FROM prescription_details WHERE prescription_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![prescription_id], |row| {
        Ok(PrescriptionDetail {
            id: row.get(0)?,
            prescription_id: row.get(1)?,
            diagnosis_id: row.get(2)?,
            patient_id: row.get(3)?,
            doctor_id: row.get(4)?,
            drug: row.get(5)?,
            dosage: row.get(6)?,
            frequency: row.get(7)?,
            duration: row.get(8)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn prescription_from_row(row: &Row<'_>) -> Result<Prescription, rusqlite::Error> {
    let status: String = row.get(6)?;
    Ok(Prescription {
        id: row.get(0)?,
        diagnosis_id: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        prescription_date: row.get(4)?,
        notes: row.get(5)?,
        status: PrescriptionStatus::from_str(&status).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("unknown prescription status: {status}").into(),
            )
        })?,
    })
}
