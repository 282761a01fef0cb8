use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{Gender, PatientStatus};

/// Demographic and medical profile of a patient.
///
/// `id` is assigned by the store on insert; callers pass 0 for new records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub dob: NaiveDate,
    pub age: i32,
    pub gender: Option<Gender>,
    pub blood_group: String,
    pub contact_number: String,
    pub emergency_contact_number: String,
    pub address: String,
    pub national_id: String,
    pub is_disabled: bool,
    pub disabilities_or_diseases: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_history: Option<String>,
    pub profile_photo: Option<String>,
    pub status: PatientStatus,
}
