use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{DatabaseError, DeletePolicy};
use crate::models::enums::*;
use crate::models::*;

use super::{enforce_delete_policy, from_json_list, not_found, to_json_list};

const PATIENT_COLUMNS: &str = "id, name, dob, age, gender, blood_group, contact_number, \
     emergency_contact_number, address, national_id, is_disabled, \
     disabilities_or_diseases, allergies, medical_history, profile_photo, status";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (name, dob, age, gender, blood_group, contact_number,
         emergency_contact_number, address, national_id, is_disabled,
         disabilities_or_diseases, allergies, medical_history, profile_photo, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            patient.name,
            patient.dob,
            patient.age,
            patient.gender.map(|g| g.as_str()),
            patient.blood_group,
            patient.contact_number,
            patient.emergency_contact_number,
            patient.address,
            patient.national_id,
            patient.is_disabled as i32,
            to_json_list(&patient.disabilities_or_diseases),
            to_json_list(&patient.allergies),
            patient.medical_history,
            patient.profile_photo,
            patient.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
        params![id],
        patient_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_patients(
    conn: &Connection,
    filter: &PatientFilter,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt;
    let rows = match filter.status {
        Some(status) => {
            stmt = conn.prepare(&format!(
                "SELECT {PATIENT_COLUMNS} FROM patients WHERE status = ?1 ORDER BY id"
            ))?;
            stmt.query_map(params![status.as_str()], patient_from_row)?
        }
        None => {
            stmt = conn.prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id"))?;
            stmt.query_map([], patient_from_row)?
        }
    };
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Full update of the mutable patient fields. Fails with NotFound if the
/// id does not exist.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET name = ?2, dob = ?3, age = ?4, gender = ?5, blood_group = ?6,
         contact_number = ?7, emergency_contact_number = ?8, address = ?9, national_id = ?10,
         is_disabled = ?11, disabilities_or_diseases = ?12, allergies = ?13,
         medical_history = ?14, profile_photo = ?15, status = ?16,
         updated_at = CURRENT_TIMESTAMP
         WHERE id = ?1",
        params![
            patient.id,
            patient.name,
            patient.dob,
            patient.age,
            patient.gender.map(|g| g.as_str()),
            patient.blood_group,
            patient.contact_number,
            patient.emergency_contact_number,
            patient.address,
            patient.national_id,
            patient.is_disabled as i32,
            to_json_list(&patient.disabilities_or_diseases),
            to_json_list(&patient.allergies),
            patient.medical_history,
            patient.profile_photo,
            patient.status.as_str(),
        ],
    )?;
    if changed == 0 {
        return Err(not_found("Patient", patient.id));
    }
    Ok(())
}

/// Patients are never hard-deleted; delete marks the record inactive.
/// Dependents (diagnoses, allotments) keep their references intact.
pub fn soft_delete_patient(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET status = 'inactive', updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(not_found("Patient", id));
    }
    Ok(())
}

/// Hard delete, applied only by administrative cleanup. Restricted while
/// clinical history or admission records reference the patient.
pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    enforce_delete_policy(conn, DeletePolicy::Restrict, "diagnoses", "patient_id", id)?;
    enforce_delete_policy(conn, DeletePolicy::Restrict, "allotments", "patient_id", id)?;
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("Patient", id));
    }
    Ok(())
}

fn patient_from_row(row: &Row<'_>) -> Result<Patient, rusqlite::Error> {
    let gender: Option<String> = row.get(4)?;
    let diseases: String = row.get(11)?;
    let allergies: String = row.get(12)?;
    let status: String = row.get(15)?;
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        dob: row.get(2)?,
        age: row.get(3)?,
        gender: gender.and_then(|g| Gender::from_str(&g).ok()),
        blood_group: row.get(5)?,
        contact_number: row.get(6)?,
        emergency_contact_number: row.get(7)?,
        address: row.get(8)?,
        national_id: row.get(9)?,
        is_disabled: row.get::<_, i32>(10)? != 0,
        disabilities_or_diseases: from_json_list(&diseases),
        allergies: from_json_list(&allergies),
        medical_history: row.get(13)?,
        profile_photo: row.get(14)?,
        status: PatientStatus::from_str(&status).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                15,
                rusqlite::types::Type::Text,
                format!("unknown patient status: {status}").into(),
            )
        })?,
    })
}
