//! Allotment manager: assigns and releases beds for patients.
//!
//! Invariants enforced here and backed by partial unique indexes in the
//! store: a patient holds at most one open allotment, and a bed with
//! `is_occupied = true` has exactly one open allotment pointing to it.
//! Every multi-row write runs inside a single transaction; preconditions
//! are re-checked inside it so two racing requests cannot double-book.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{repository, DatabaseError};
use crate::models::{Allotment, AllotmentDetail};

/// Errors from allotment operations.
#[derive(Debug, thiserror::Error)]
pub enum AllotmentError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: &'static str, id: i64 },
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Input for admitting a patient to a bed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRequest {
    pub patient_id: i64,
    pub bed_id: i64,
    pub admission_date: NaiveDate,
    pub admission_time: NaiveTime,
}

/// Admit a patient: create an open allotment and mark the bed occupied,
/// atomically.
pub fn create_allotment(
    conn: &Connection,
    request: &AdmissionRequest,
) -> Result<Allotment, AllotmentError> {
    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    if repository::get_patient(&tx, request.patient_id)?.is_none() {
        return Err(AllotmentError::NotFound {
            entity_type: "Patient",
            id: request.patient_id,
        });
    }
    let bed = repository::get_bed(&tx, request.bed_id)?.ok_or(AllotmentError::NotFound {
        entity_type: "Bed",
        id: request.bed_id,
    })?;

    if repository::get_open_allotment_for_patient(&tx, request.patient_id)?.is_some() {
        return Err(AllotmentError::Conflict(format!(
            "patient {} is already admitted",
            request.patient_id
        )));
    }
    if bed.is_occupied || repository::get_open_allotment_for_bed(&tx, request.bed_id)?.is_some() {
        return Err(AllotmentError::Conflict(format!(
            "bed {} is already occupied",
            request.bed_id
        )));
    }

    let draft = Allotment {
        id: 0,
        patient_id: request.patient_id,
        bed_id: request.bed_id,
        admission_date: request.admission_date,
        admission_time: request.admission_time,
        discharge_date: None,
        discharge_notes: None,
    };
    // The partial unique indexes are the backstop against a race that
    // slipped past the checks above.
    let id = match repository::insert_allotment(&tx, &draft) {
        Ok(id) => id,
        Err(DatabaseError::Sqlite(e)) if is_unique_violation(&e) => {
            return Err(AllotmentError::Conflict(format!(
                "bed {} or patient {} was allotted concurrently",
                request.bed_id, request.patient_id
            )));
        }
        Err(e) => return Err(e.into()),
    };
    repository::set_bed_occupied(&tx, request.bed_id, true)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(
        allotment_id = id,
        patient_id = request.patient_id,
        bed_id = request.bed_id,
        "patient admitted"
    );
    Ok(Allotment { id, ..draft })
}

/// Discharge an open allotment: stamp the discharge fields and free the
/// bed, atomically.
pub fn discharge_allotment(
    conn: &Connection,
    allotment_id: i64,
    discharge_date: NaiveDate,
    discharge_notes: Option<&str>,
) -> Result<Allotment, AllotmentError> {
    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    let allotment =
        repository::get_allotment(&tx, allotment_id)?.ok_or(AllotmentError::NotFound {
            entity_type: "Allotment",
            id: allotment_id,
        })?;
    if !allotment.is_open() {
        return Err(AllotmentError::Conflict(format!(
            "allotment {allotment_id} is already discharged"
        )));
    }

    repository::set_allotment_discharged(&tx, allotment_id, discharge_date, discharge_notes)?;
    repository::set_bed_occupied(&tx, allotment.bed_id, false)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(
        allotment_id,
        patient_id = allotment.patient_id,
        bed_id = allotment.bed_id,
        "patient discharged"
    );
    Ok(Allotment {
        discharge_date: Some(discharge_date),
        discharge_notes: discharge_notes.map(String::from),
        ..allotment
    })
}

/// The patient's open allotment joined with ward/room/bed detail.
pub fn get_patient_allotment(
    conn: &Connection,
    patient_id: i64,
) -> Result<AllotmentDetail, AllotmentError> {
    if repository::get_patient(conn, patient_id)?.is_none() {
        return Err(AllotmentError::NotFound {
            entity_type: "Patient",
            id: patient_id,
        });
    }
    repository::get_open_allotment_detail(conn, patient_id)?.ok_or(AllotmentError::NotFound {
        entity_type: "open Allotment for patient",
        id: patient_id,
    })
}

/// All allotments, open and closed, newest first.
pub fn list_allotments(conn: &Connection) -> Result<Vec<Allotment>, AllotmentError> {
    Ok(repository::list_allotments(conn)?)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::Connection;

    use crate::db::repository::{get_allotment, get_bed, insert_bed, insert_patient, insert_room, insert_ward};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::*;
    use crate::models::*;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_patient(conn: &Connection, name: &str) -> i64 {
        insert_patient(
            conn,
            &Patient {
                id: 0,
                name: name.into(),
                dob: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
                age: 35,
                gender: Some(Gender::Female),
                blood_group: "O+".into(),
                contact_number: "5550001111".into(),
                emergency_contact_number: "5550002222".into(),
                address: "12 Hill Road".into(),
                national_id: "123412341234".into(),
                is_disabled: false,
                disabilities_or_diseases: vec![],
                allergies: vec!["penicillin".into()],
                medical_history: None,
                profile_photo: None,
                status: PatientStatus::Active,
            },
        )
        .unwrap()
    }

    fn make_bed(conn: &Connection) -> i64 {
        let ward_id = insert_ward(
            conn,
            &Ward {
                id: 0,
                name: "East Wing".into(),
                ward_type: WardType::General,
                floor_number: 2,
            },
        )
        .unwrap();
        let room_id = insert_room(
            conn,
            &Room {
                id: 0,
                ward_id,
                room_number: 201,
            },
        )
        .unwrap();
        insert_bed(
            conn,
            &Bed {
                id: 0,
                room_id,
                bed_number: 1,
                is_occupied: false,
            },
        )
        .unwrap()
    }

    fn admission(patient_id: i64, bed_id: i64) -> AdmissionRequest {
        AdmissionRequest {
            patient_id,
            bed_id,
            admission_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            admission_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn create_allotment_occupies_bed() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let bed_id = make_bed(&conn);

        let allotment = create_allotment(&conn, &admission(patient_id, bed_id)).unwrap();
        assert!(allotment.id > 0);
        assert!(allotment.is_open());

        let bed = get_bed(&conn, bed_id).unwrap().unwrap();
        assert!(bed.is_occupied);
    }

    #[test]
    fn create_allotment_conflict_on_occupied_bed() {
        let conn = test_db();
        let first = make_patient(&conn, "Asha");
        let second = make_patient(&conn, "Ravi");
        let bed_id = make_bed(&conn);

        create_allotment(&conn, &admission(first, bed_id)).unwrap();
        let result = create_allotment(&conn, &admission(second, bed_id));
        assert!(matches!(result, Err(AllotmentError::Conflict(_))));

        // No second row persisted
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM allotments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn create_allotment_conflict_on_double_admission() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let first_bed = make_bed(&conn);
        let second_bed = {
            let room_id = get_bed(&conn, first_bed).unwrap().unwrap().room_id;
            insert_bed(
                &conn,
                &Bed {
                    id: 0,
                    room_id,
                    bed_number: 2,
                    is_occupied: false,
                },
            )
            .unwrap()
        };

        create_allotment(&conn, &admission(patient_id, first_bed)).unwrap();
        let result = create_allotment(&conn, &admission(patient_id, second_bed));
        assert!(matches!(result, Err(AllotmentError::Conflict(_))));

        // Second bed stays free
        assert!(!get_bed(&conn, second_bed).unwrap().unwrap().is_occupied);
    }

    #[test]
    fn create_allotment_missing_patient() {
        let conn = test_db();
        let bed_id = make_bed(&conn);
        let result = create_allotment(&conn, &admission(999, bed_id));
        assert!(matches!(
            result,
            Err(AllotmentError::NotFound { entity_type: "Patient", .. })
        ));
    }

    #[test]
    fn create_allotment_missing_bed() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let result = create_allotment(&conn, &admission(patient_id, 999));
        assert!(matches!(
            result,
            Err(AllotmentError::NotFound { entity_type: "Bed", .. })
        ));
    }

    #[test]
    fn discharge_frees_bed_and_closes_allotment() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let bed_id = make_bed(&conn);
        let allotment = create_allotment(&conn, &admission(patient_id, bed_id)).unwrap();

        let discharged = discharge_allotment(
            &conn,
            allotment.id,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            Some("recovered"),
        )
        .unwrap();
        assert!(!discharged.is_open());
        assert_eq!(discharged.discharge_notes.as_deref(), Some("recovered"));

        assert!(!get_bed(&conn, bed_id).unwrap().unwrap().is_occupied);

        // Patient can be admitted again after discharge
        let again = create_allotment(&conn, &admission(patient_id, bed_id));
        assert!(again.is_ok());
    }

    #[test]
    fn double_discharge_is_conflict_and_leaves_state_unchanged() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let bed_id = make_bed(&conn);
        let allotment = create_allotment(&conn, &admission(patient_id, bed_id)).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        discharge_allotment(&conn, allotment.id, date, None).unwrap();

        let second = discharge_allotment(
            &conn,
            allotment.id,
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            Some("again"),
        );
        assert!(matches!(second, Err(AllotmentError::Conflict(_))));

        let stored = get_allotment(&conn, allotment.id).unwrap().unwrap();
        assert_eq!(stored.discharge_date, Some(date));
        assert_eq!(stored.discharge_notes, None);
    }

    #[test]
    fn discharge_missing_allotment() {
        let conn = test_db();
        let result = discharge_allotment(
            &conn,
            42,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            None,
        );
        assert!(matches!(result, Err(AllotmentError::NotFound { .. })));
    }

    #[test]
    fn get_patient_allotment_joins_location() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let bed_id = make_bed(&conn);
        create_allotment(&conn, &admission(patient_id, bed_id)).unwrap();

        let detail = get_patient_allotment(&conn, patient_id).unwrap();
        assert_eq!(detail.ward_name, "East Wing");
        assert_eq!(detail.ward_type, WardType::General);
        assert_eq!(detail.floor_number, 2);
        assert_eq!(detail.room_number, 201);
        assert_eq!(detail.bed_number, 1);
        assert_eq!(detail.allotment.patient_id, patient_id);
    }

    #[test]
    fn get_patient_allotment_none_open() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let result = get_patient_allotment(&conn, patient_id);
        assert!(matches!(result, Err(AllotmentError::NotFound { .. })));
    }

    #[test]
    fn open_allotment_unique_at_store_level() {
        let conn = test_db();
        let patient_id = make_patient(&conn, "Asha");
        let bed_id = make_bed(&conn);
        create_allotment(&conn, &admission(patient_id, bed_id)).unwrap();

        // Bypass the service checks: the partial unique indexes still
        // reject a second open row for the same patient/bed.
        let result = conn.execute(
            "INSERT INTO allotments (patient_id, bed_id, admission_date, admission_time)
             VALUES (?1, ?2, '2025-02-01', '10:00:00')",
            rusqlite::params![patient_id, bed_id],
        );
        assert!(result.is_err());
    }

    #[test]
    fn list_allotments_newest_first() {
        let conn = test_db();
        let first = make_patient(&conn, "Asha");
        let second = make_patient(&conn, "Ravi");
        let bed_id = make_bed(&conn);

        let a1 = create_allotment(&conn, &admission(first, bed_id)).unwrap();
        discharge_allotment(&conn, a1.id, NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(), None)
            .unwrap();
        let a2 = create_allotment(&conn, &admission(second, bed_id)).unwrap();

        let all = list_allotments(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a2.id);
        assert_eq!(all[1].id, a1.id);
    }
}
