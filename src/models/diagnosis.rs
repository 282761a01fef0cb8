use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::DiagnosisStatus;

/// A clinical visit record for a patient by a doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis_date: NaiveDate,
    pub diagnosis_time: NaiveTime,
    pub blood_pressure: String,
    pub blood_sugar: String,
    pub spo2: i32,
    pub heart_rate: i32,
    pub summary: String,
    /// Test codes requested during the visit.
    pub requested_tests: Vec<String>,
    pub status: DiagnosisStatus,
}
