use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::TestStatus;

/// An ordered instance of a catalog test tied to a diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPrescribed {
    pub id: i64,
    pub test_code: String,
    pub diagnosis_id: i64,
    pub prescription_id: Option<i64>,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub test_date: NaiveDate,
    pub test_time: NaiveTime,
    pub results: Option<String>,
    pub result_file: Option<String>,
    pub comments: String,
    pub status: TestStatus,
}
