//! Clinical episode composer: creates a diagnosis together with its
//! optional prescription, line items and ordered tests as one atomic
//! unit, and assembles the composite read view.
//!
//! Validation runs field-by-field before any write; any failure during
//! the composite insert rolls the whole transaction back, so no partial
//! episode ever persists.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{repository, DatabaseError};
use crate::models::enums::{DiagnosisStatus, PrescriptionStatus, TestStatus};
use crate::models::*;

/// One malformed or missing field, addressed by path
/// (e.g. `prescription.line_items[1].drug`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Errors from episode operations.
#[derive(Debug, thiserror::Error)]
pub enum EpisodeError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: &'static str, id: i64 },
    #[error("Validation failed: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldError>),
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// A drug line item in a prescription payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub drug: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

/// Optional prescription payload attached to a new diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionInput {
    pub notes: String,
    pub line_items: Vec<LineItemInput>,
}

/// Input for composing a new clinical episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisInput {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis_date: NaiveDate,
    pub diagnosis_time: NaiveTime,
    pub blood_pressure: String,
    pub blood_sugar: String,
    pub spo2: i32,
    pub heart_rate: i32,
    pub summary: String,
    /// Catalog test codes to order alongside the diagnosis.
    pub requested_tests: Vec<String>,
    pub prescription: Option<PrescriptionInput>,
}

/// Partial update payload. Only provided fields are merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosisPatch {
    pub blood_pressure: Option<String>,
    pub blood_sugar: Option<String>,
    pub spo2: Option<i32>,
    pub heart_rate: Option<i32>,
    pub summary: Option<String>,
    pub requested_tests: Option<Vec<String>>,
    pub status: Option<DiagnosisStatus>,
}

/// Read-only composite view: diagnosis + optional prescription with its
/// line items + the tests prescribed under it.
#[derive(Debug, Clone, Serialize)]
pub struct Episode {
    pub diagnosis: Diagnosis,
    pub prescription: Option<PrescriptionView>,
    pub tests_prescribed: Vec<TestPrescribed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionView {
    pub prescription: Prescription,
    pub details: Vec<PrescriptionDetail>,
}

/// Compose a new episode in one transaction: diagnosis (ongoing), then
/// the optional prescription (active) with its line items, then one
/// pending test order per requested test code. All-or-nothing.
pub fn create_diagnosis(
    conn: &Connection,
    input: &DiagnosisInput,
) -> Result<Episode, EpisodeError> {
    validate_input(conn, input)?;

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    if repository::get_patient(&tx, input.patient_id)?.is_none() {
        return Err(EpisodeError::NotFound {
            entity_type: "Patient",
            id: input.patient_id,
        });
    }
    if repository::get_doctor(&tx, input.doctor_id)?.is_none() {
        return Err(EpisodeError::NotFound {
            entity_type: "Doctor",
            id: input.doctor_id,
        });
    }

    let diagnosis_id = repository::insert_diagnosis(
        &tx,
        &Diagnosis {
            id: 0,
            patient_id: input.patient_id,
            doctor_id: input.doctor_id,
            diagnosis_date: input.diagnosis_date,
            diagnosis_time: input.diagnosis_time,
            blood_pressure: input.blood_pressure.clone(),
            blood_sugar: input.blood_sugar.clone(),
            spo2: input.spo2,
            heart_rate: input.heart_rate,
            summary: input.summary.clone(),
            requested_tests: input.requested_tests.clone(),
            status: DiagnosisStatus::Ongoing,
        },
    )?;

    let prescription_id = match &input.prescription {
        Some(payload) => {
            let prescription_id = match repository::insert_prescription(
                &tx,
                &Prescription {
                    id: 0,
                    diagnosis_id,
                    patient_id: input.patient_id,
                    doctor_id: input.doctor_id,
                    prescription_date: input.diagnosis_date,
                    notes: payload.notes.clone(),
                    status: PrescriptionStatus::Active,
                },
            ) {
                Ok(id) => id,
                Err(DatabaseError::Sqlite(e)) if is_unique_violation(&e) => {
                    return Err(EpisodeError::Conflict(format!(
                        "diagnosis {diagnosis_id} already has a prescription"
                    )));
                }
                Err(e) => return Err(e.into()),
            };
            for item in &payload.line_items {
                repository::insert_prescription_detail(
                    &tx,
                    &PrescriptionDetail {
                        id: 0,
                        prescription_id,
                        diagnosis_id,
                        patient_id: input.patient_id,
                        doctor_id: input.doctor_id,
                        drug: item.drug.clone(),
                        dosage: item.dosage.clone(),
                        frequency: item.frequency.clone(),
                        duration: item.duration.clone(),
                    },
                )?;
            }
            Some(prescription_id)
        }
        None => None,
    };

    for test_code in &input.requested_tests {
        repository::insert_test_prescribed(
            &tx,
            &TestPrescribed {
                id: 0,
                test_code: test_code.clone(),
                diagnosis_id,
                prescription_id,
                patient_id: input.patient_id,
                doctor_id: input.doctor_id,
                test_date: input.diagnosis_date,
                test_time: input.diagnosis_time,
                results: None,
                result_file: None,
                comments: String::new(),
                status: TestStatus::Pending,
            },
        )?;
    }

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(
        diagnosis_id,
        patient_id = input.patient_id,
        doctor_id = input.doctor_id,
        tests = input.requested_tests.len(),
        "episode created"
    );
    get_full_episode(conn, diagnosis_id)
}

/// Merge the provided fields into the diagnosis identified by the
/// (diagnosis, patient) pair. Status may only move ongoing→completed or
/// ongoing→cancelled.
pub fn update_diagnosis(
    conn: &Connection,
    diagnosis_id: i64,
    patient_id: i64,
    patch: &DiagnosisPatch,
) -> Result<Diagnosis, EpisodeError> {
    let mut diagnosis = repository::get_diagnosis_for_patient(conn, diagnosis_id, patient_id)?
        .ok_or(EpisodeError::NotFound {
            entity_type: "Diagnosis",
            id: diagnosis_id,
        })?;

    if let Some(status) = patch.status {
        if status != diagnosis.status && !diagnosis.status.can_transition_to(status) {
            return Err(EpisodeError::Conflict(format!(
                "diagnosis {diagnosis_id} cannot move from {} to {}",
                diagnosis.status.as_str(),
                status.as_str()
            )));
        }
        diagnosis.status = status;
    }
    if let Some(blood_pressure) = &patch.blood_pressure {
        diagnosis.blood_pressure = blood_pressure.clone();
    }
    if let Some(blood_sugar) = &patch.blood_sugar {
        diagnosis.blood_sugar = blood_sugar.clone();
    }
    if let Some(spo2) = patch.spo2 {
        diagnosis.spo2 = spo2;
    }
    if let Some(heart_rate) = patch.heart_rate {
        diagnosis.heart_rate = heart_rate;
    }
    if let Some(summary) = &patch.summary {
        diagnosis.summary = summary.clone();
    }
    if let Some(requested_tests) = &patch.requested_tests {
        diagnosis.requested_tests = requested_tests.clone();
    }

    repository::update_diagnosis(conn, &diagnosis)?;
    Ok(diagnosis)
}

/// Assemble the composite view. `prescription` is None when the diagnosis
/// was created without one.
pub fn get_full_episode(conn: &Connection, diagnosis_id: i64) -> Result<Episode, EpisodeError> {
    let diagnosis =
        repository::get_diagnosis(conn, diagnosis_id)?.ok_or(EpisodeError::NotFound {
            entity_type: "Diagnosis",
            id: diagnosis_id,
        })?;

    let prescription = match repository::get_prescription_for_diagnosis(conn, diagnosis_id)? {
        Some(prescription) => {
            let details = repository::list_prescription_details(conn, prescription.id)?;
            Some(PrescriptionView {
                prescription,
                details,
            })
        }
        None => None,
    };
    let tests_prescribed = repository::list_tests_for_diagnosis(conn, diagnosis_id)?;

    Ok(Episode {
        diagnosis,
        prescription,
        tests_prescribed,
    })
}

/// Attach results to a pending test order, completing it.
pub fn attach_test_results(
    conn: &Connection,
    test_prescribed_id: i64,
    results: &str,
    result_file: Option<&str>,
) -> Result<TestPrescribed, EpisodeError> {
    let test = repository::get_test_prescribed(conn, test_prescribed_id)?.ok_or(
        EpisodeError::NotFound {
            entity_type: "TestPrescribed",
            id: test_prescribed_id,
        },
    )?;
    if !test.status.can_transition_to(TestStatus::Completed) {
        return Err(EpisodeError::Conflict(format!(
            "test order {test_prescribed_id} is already {}",
            test.status.as_str()
        )));
    }
    repository::set_test_results(conn, test_prescribed_id, results, result_file, TestStatus::Completed)?;
    Ok(TestPrescribed {
        results: Some(results.into()),
        result_file: result_file.map(String::from),
        status: TestStatus::Completed,
        ..test
    })
}

/// Cancel a pending test order.
pub fn cancel_test_prescribed(
    conn: &Connection,
    test_prescribed_id: i64,
) -> Result<(), EpisodeError> {
    let test = repository::get_test_prescribed(conn, test_prescribed_id)?.ok_or(
        EpisodeError::NotFound {
            entity_type: "TestPrescribed",
            id: test_prescribed_id,
        },
    )?;
    if !test.status.can_transition_to(TestStatus::Cancelled) {
        return Err(EpisodeError::Conflict(format!(
            "test order {test_prescribed_id} is already {}",
            test.status.as_str()
        )));
    }
    repository::set_test_status(conn, test_prescribed_id, TestStatus::Cancelled)?;
    Ok(())
}

pub fn list_diagnoses_for_patient(
    conn: &Connection,
    patient_id: i64,
    status: Option<DiagnosisStatus>,
) -> Result<Vec<Diagnosis>, EpisodeError> {
    Ok(repository::list_diagnoses(
        conn,
        &DiagnosisFilter {
            patient_id: Some(patient_id),
            status,
            ..Default::default()
        },
    )?)
}

pub fn list_diagnoses_for_doctor(
    conn: &Connection,
    doctor_id: i64,
    status: Option<DiagnosisStatus>,
) -> Result<Vec<Diagnosis>, EpisodeError> {
    Ok(repository::list_diagnoses(
        conn,
        &DiagnosisFilter {
            doctor_id: Some(doctor_id),
            status,
            ..Default::default()
        },
    )?)
}

/// Field-by-field validation, run before any write. Catalog lookups for
/// requested test codes are reads and happen here too.
fn validate_input(conn: &Connection, input: &DiagnosisInput) -> Result<(), EpisodeError> {
    let mut errors = Vec::new();

    let require = |errors: &mut Vec<FieldError>, field: &str, value: &str| {
        if value.trim().is_empty() {
            errors.push(FieldError {
                field: field.into(),
                message: "must not be empty".into(),
            });
        }
    };

    require(&mut errors, "summary", &input.summary);
    require(&mut errors, "blood_pressure", &input.blood_pressure);
    require(&mut errors, "blood_sugar", &input.blood_sugar);
    if !(0..=100).contains(&input.spo2) {
        errors.push(FieldError {
            field: "spo2".into(),
            message: format!("{} is outside 0-100", input.spo2),
        });
    }
    if !(1..=400).contains(&input.heart_rate) {
        errors.push(FieldError {
            field: "heart_rate".into(),
            message: format!("{} is not a plausible heart rate", input.heart_rate),
        });
    }

    for (i, code) in input.requested_tests.iter().enumerate() {
        if code.trim().is_empty() {
            errors.push(FieldError {
                field: format!("requested_tests[{i}]"),
                message: "must not be empty".into(),
            });
        } else if repository::get_medical_test_by_code(conn, code)?.is_none() {
            errors.push(FieldError {
                field: format!("requested_tests[{i}]"),
                message: format!("unknown test code {code}"),
            });
        }
    }

    if let Some(prescription) = &input.prescription {
        for (i, item) in prescription.line_items.iter().enumerate() {
            let path = |name: &str| format!("prescription.line_items[{i}].{name}");
            require(&mut errors, &path("drug"), &item.drug);
            require(&mut errors, &path("dosage"), &item.dosage);
            require(&mut errors, &path("frequency"), &item.frequency);
            require(&mut errors, &path("duration"), &item.duration);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(EpisodeError::Validation(errors))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
