use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{DoctorStatus, Gender};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub dob: NaiveDate,
    pub age: i32,
    pub gender: Option<Gender>,
    pub medical_license_number: String,
    pub department_id: Option<i64>,
    pub working_hours: String,
    pub contact_number: String,
    pub email: String,
    pub national_id: String,
    pub address: String,
    pub qualifications: Vec<String>,
    pub specializations: Vec<String>,
    pub years_of_experience: i32,
    pub profile_photo: Option<String>,
    pub status: DoctorStatus,
}
