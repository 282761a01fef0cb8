use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{DatabaseError, DeletePolicy};
use crate::models::enums::*;
use crate::models::*;

use super::{enforce_delete_policy, from_json_list, not_found, to_json_list};

const DOCTOR_COLUMNS: &str = "id, name, dob, age, gender, medical_license_number, department_id, \
     working_hours, contact_number, email, national_id, address, qualifications, \
     specializations, years_of_experience, profile_photo, status";

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (name, dob, age, gender, medical_license_number, department_id,
         working_hours, contact_number, email, national_id, address, qualifications,
         specializations, years_of_experience, profile_photo, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            doctor.name,
            doctor.dob,
            doctor.age,
            doctor.gender.map(|g| g.as_str()),
            doctor.medical_license_number,
            doctor.department_id,
            doctor.working_hours,
            doctor.contact_number,
            doctor.email,
            doctor.national_id,
            doctor.address,
            to_json_list(&doctor.qualifications),
            to_json_list(&doctor.specializations),
            doctor.years_of_experience,
            doctor.profile_photo,
            doctor.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
        params![id],
        doctor_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id"))?;
    let rows = stmt.query_map([], doctor_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn list_doctors_in_department(
    conn: &Connection,
    department_id: i64,
) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE department_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![department_id], doctor_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET name = ?2, dob = ?3, age = ?4, gender = ?5,
         medical_license_number = ?6, department_id = ?7, working_hours = ?8,
         contact_number = ?9, email = ?10, national_id = ?11, address = ?12,
         qualifications = ?13, specializations = ?14, years_of_experience = ?15,
         profile_photo = ?16, status = ?17, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?1",
        params![
            doctor.id,
            doctor.name,
            doctor.dob,
            doctor.age,
            doctor.gender.map(|g| g.as_str()),
            doctor.medical_license_number,
            doctor.department_id,
            doctor.working_hours,
            doctor.contact_number,
            doctor.email,
            doctor.national_id,
            doctor.address,
            to_json_list(&doctor.qualifications),
            to_json_list(&doctor.specializations),
            doctor.years_of_experience,
            doctor.profile_photo,
            doctor.status.as_str(),
        ],
    )?;
    if changed == 0 {
        return Err(not_found("Doctor", doctor.id));
    }
    Ok(())
}

/// Delete a doctor. Restricted while clinical records reference them;
/// a department headship is nulled out instead.
pub fn delete_doctor(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    enforce_delete_policy(conn, DeletePolicy::Restrict, "diagnoses", "doctor_id", id)?;
    enforce_delete_policy(conn, DeletePolicy::Restrict, "prescriptions", "doctor_id", id)?;
    enforce_delete_policy(conn, DeletePolicy::Restrict, "tests_prescribed", "doctor_id", id)?;
    enforce_delete_policy(conn, DeletePolicy::Nullify, "departments", "head_doctor_id", id)?;
    let changed = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("Doctor", id));
    }
    Ok(())
}

fn doctor_from_row(row: &Row<'_>) -> Result<Doctor, rusqlite::Error> {
    let gender: Option<String> = row.get(4)?;
    let qualifications: String = row.get(12)?;
    let specializations: String = row.get(13)?;
    let status: String = row.get(16)?;
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        dob: row.get(2)?,
        age: row.get(3)?,
        gender: gender.and_then(|g| Gender::from_str(&g).ok()),
        medical_license_number: row.get(5)?,
        department_id: row.get(6)?,
        working_hours: row.get(7)?,
        contact_number: row.get(8)?,
        email: row.get(9)?,
        national_id: row.get(10)?,
        address: row.get(11)?,
        qualifications: from_json_list(&qualifications),
        specializations: from_json_list(&specializations),
        years_of_experience: row.get(14)?,
        profile_photo: row.get(15)?,
        status: DoctorStatus::from_str(&status).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                16,
                rusqlite::types::Type::Text,
                format!("unknown doctor status: {status}").into(),
            )
        })?,
    })
}
