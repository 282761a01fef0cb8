use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{DatabaseError, DeletePolicy};
use crate::models::Department;

use super::{enforce_delete_policy, not_found};

pub fn insert_department(conn: &Connection, dept: &Department) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO departments (name, description, head_doctor_id) VALUES (?1, ?2, ?3)",
        params![dept.name, dept.description, dept.head_doctor_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_department(conn: &Connection, id: i64) -> Result<Option<Department>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, description, head_doctor_id FROM departments WHERE id = ?1",
        params![id],
        department_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_departments(conn: &Connection) -> Result<Vec<Department>, DatabaseError> {
    let mut stmt = conn
        .prepare("SELECT id, name, description, head_doctor_id FROM departments ORDER BY id")?;
    let rows = stmt.query_map([], department_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn update_department(conn: &Connection, dept: &Department) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE departments SET name = ?2, description = ?3, head_doctor_id = ?4,
         updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![dept.id, dept.name, dept.description, dept.head_doctor_id],
    )?;
    if changed == 0 {
        return Err(not_found("Department", dept.id));
    }
    Ok(())
}

/// Delete a department. Doctor references are nulled, not removed.
pub fn delete_department(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    enforce_delete_policy(conn, DeletePolicy::Nullify, "doctors", "department_id", id)?;
    let changed = conn.execute("DELETE FROM departments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(not_found("Department", id));
    }
    Ok(())
}

fn department_from_row(row: &Row<'_>) -> Result<Department, rusqlite::Error> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        head_doctor_id: row.get(3)?,
    })
}
