use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{DatabaseError, DeletePolicy};
use crate::models::enums::WardType;
use crate::models::*;

use super::{enforce_delete_policy, not_found};

pub fn insert_ward(conn: &Connection, ward: &Ward) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO wards (name, ward_type, floor_number) VALUES (?1, ?2, ?3)",
        params![ward.name, ward.ward_type.as_str(), ward.floor_number],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_ward(conn: &Connection, id: i64) -> Result<Option<Ward>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, ward_type, floor_number FROM wards WHERE id = ?1",
        params![id],
        ward_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_wards(conn: &Connection) -> Result<Vec<Ward>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, ward_type, floor_number FROM wards ORDER BY id")?;
    let rows = stmt.query_map([], ward_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Delete a ward and everything inside it (rooms, then their beds).
pub fn delete_ward(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare("SELECT id FROM rooms WHERE ward_id = ?1")?;
    let room_ids: Vec<i64> = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    drop(stmt);

    for room_id in room_ids {
        let mut bed_stmt = conn.prepare("SELECT id FROM beds WHERE room_id = ?1")?;
        let bed_ids: Vec<i64> = bed_stmt
            .query_map(params![room_id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        drop(bed_stmt);
        for bed_id in bed_ids {
            enforce_delete_policy(conn, DeletePolicy::Restrict, "allotments", "bed_id", bed_id)?;
        }
        enforce_delete_policy(conn, DeletePolicy::Cascade, "beds", "room_id", room_id)?;
    }
    enforce_delete_policy(conn, DeletePolicy::Cascade, "rooms", "ward_id", id)?;
    let changed = conn.execute("DELETE FROM wards WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("Ward", id));
    }
    Ok(())
}

pub fn insert_room(conn: &Connection, room: &Room) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO rooms (ward_id, room_number) VALUES (?1, ?2)",
        params![room.ward_id, room.room_number],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_room(conn: &Connection, id: i64) -> Result<Option<Room>, DatabaseError> {
    conn.query_row(
        "SELECT id, ward_id, room_number FROM rooms WHERE id = ?1",
        params![id],
        |row| {
            Ok(Room {
                id: row.get(0)?,
                ward_id: row.get(1)?,
                room_number: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn insert_bed(conn: &Connection, bed: &Bed) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO beds (room_id, bed_number, is_occupied) VALUES (?1, ?2, ?3)",
        params![bed.room_id, bed.bed_number, bed.is_occupied as i32],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_bed(conn: &Connection, id: i64) -> Result<Option<Bed>, DatabaseError> {
    conn.query_row(
        "SELECT id, room_id, bed_number, is_occupied FROM beds WHERE id = ?1",
        params![id],
        bed_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_beds(conn: &Connection, filter: &BedFilter) -> Result<Vec<Bed>, DatabaseError> {
    let mut sql = String::from(
        "SELECT b.id, b.room_id, b.bed_number, b.is_occupied FROM beds b
         JOIN rooms r ON r.id = b.room_id",
    );
    let mut clauses = Vec::new();
    if filter.ward_id.is_some() {
        clauses.push("r.ward_id = ?1");
    }
    if filter.free_only {
        clauses.push("b.is_occupied = 0");
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY b.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = match filter.ward_id {
        Some(ward_id) => stmt.query_map(params![ward_id], bed_from_row)?,
        None => stmt.query_map([], bed_from_row)?,
    };
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Flip bed occupancy. Callers run this inside the same transaction as the
/// allotment write so the flag and the open allotment stay in lockstep.
pub fn set_bed_occupied(conn: &Connection, id: i64, occupied: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE beds SET is_occupied = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id, occupied as i32],
    )?;
    if changed == 0 {
        return Err(not_found("Bed", id));
    }
    Ok(())
}

fn ward_from_row(row: &Row<'_>) -> Result<Ward, rusqlite::Error> {
    let ward_type: String = row.get(2)?;
    Ok(Ward {
        id: row.get(0)?,
        name: row.get(1)?,
        ward_type: WardType::from_str(&ward_type).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown ward type: {ward_type}").into(),
            )
        })?,
        floor_number: row.get(3)?,
    })
}

fn bed_from_row(row: &Row<'_>) -> Result<Bed, rusqlite::Error> {
    Ok(Bed {
        id: row.get(0)?,
        room_id: row.get(1)?,
        bed_number: row.get(2)?,
        is_occupied: row.get::<_, i32>(3)? != 0,
    })
}
