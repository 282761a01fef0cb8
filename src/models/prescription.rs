use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::PrescriptionStatus;

/// At most one prescription per diagnosis (unique constraint in the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub diagnosis_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub prescription_date: NaiveDate,
    pub notes: String,
    pub status: PrescriptionStatus,
}

/// A drug line item belonging to a prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionDetail {
    pub id: i64,
    pub prescription_id: i64,
    pub diagnosis_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub drug: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}
