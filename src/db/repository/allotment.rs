use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::enums::WardType;
use crate::models::*;

use super::not_found;

const ALLOTMENT_COLUMNS: &str =
    "id, patient_id, bed_id, admission_date, admission_time, discharge_date, discharge_notes";

pub fn insert_allotment(conn: &Connection, allotment: &Allotment) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO allotments (patient_id, bed_id, admission_date, admission_time,
         discharge_date, discharge_notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            allotment.patient_id,
            allotment.bed_id,
            allotment.admission_date,
            allotment.admission_time,
            allotment.discharge_date,
            allotment.discharge_notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_allotment(conn: &Connection, id: i64) -> Result<Option<Allotment>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {ALLOTMENT_COLUMNS} FROM allotments WHERE id = ?1"),
        params![id],
        allotment_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// The open (undischarged) allotment for a patient, if any. The partial
/// unique index guarantees at most one row matches.
pub fn get_open_allotment_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<Allotment>, DatabaseError> {
    conn.query_row(
        &format!(
            "SELECT {ALLOTMENT_COLUMNS} FROM allotments
             WHERE patient_id = ?1 AND discharge_date IS NULL"
        ),
        params![patient_id],
        allotment_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_open_allotment_for_bed(
    conn: &Connection,
    bed_id: i64,
) -> Result<Option<Allotment>, DatabaseError> {
    conn.query_row(
        &format!(
            "SELECT {ALLOTMENT_COLUMNS} FROM allotments
             WHERE bed_id = ?1 AND discharge_date IS NULL"
        ),
        params![bed_id],
        allotment_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_allotments(conn: &Connection) -> Result<Vec<Allotment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALLOTMENT_COLUMNS} FROM allotments ORDER BY id DESC"
    ))?;
    let rows = stmt.query_map([], allotment_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Stamp the discharge fields on an allotment row.
pub fn set_allotment_discharged(
    conn: &Connection,
    id: i64,
    discharge_date: chrono::NaiveDate,
    discharge_notes: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE allotments SET discharge_date = ?2, discharge_notes = ?3,
         updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id, discharge_date, discharge_notes],
    )?;
    if changed == 0 {
        return Err(not_found("Allotment", id));
    }
    Ok(())
}

/// Open allotment for a patient joined with its ward/room/bed location.
pub fn get_open_allotment_detail(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<AllotmentDetail>, DatabaseError> {
    conn.query_row(
        "SELECT a.id, a.patient_id, a.bed_id, a.admission_date, a.admission_time,
                a.discharge_date, a.discharge_notes,
                w.id, w.name, w.ward_type, w.floor_number, r.id, r.room_number, b.bed_number
         FROM allotments a
         JOIN beds b ON b.id = a.bed_id
         JOIN rooms r ON r.id = b.room_id
         JOIN wards w ON w.id = r.ward_id
         WHERE a.patient_id = ?1 AND a.discharge_date IS NULL",
        params![patient_id],
        |row| {
            let ward_type: String = row.get(9)?;
            Ok(AllotmentDetail {
                allotment: allotment_from_row(row)?,
                ward_id: row.get(7)?,
                ward_name: row.get(8)?,
                ward_type: WardType::from_str(&ward_type).map_err(|_| {
                    rusqlite::Error::FromSqlConversionFailure(
                        9,
                        rusqlite::types::Type::Text,
                        format!("unknown ward type: {ward_type}").into(),
                    )
                })?,
                floor_number: row.get(10)?,
                room_id: row.get(11)?,
                room_number: row.get(12)?,
                bed_number: row.get(13)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

fn allotment_from_row(row: &Row<'_>) -> Result<Allotment, rusqlite::Error> {
    Ok(Allotment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        bed_id: row.get(2)?,
        admission_date: row.get(3)?,
        admission_time: row.get(4)?,
        discharge_date: row.get(5)?,
        discharge_notes: row.get(6)?,
    })
}
