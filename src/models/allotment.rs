use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::WardType;

/// A patient's admission record occupying a bed for a time span.
/// An allotment with no discharge date is "open": the patient is
/// currently admitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allotment {
    pub id: i64,
    pub patient_id: i64,
    pub bed_id: i64,
    pub admission_date: NaiveDate,
    pub admission_time: NaiveTime,
    pub discharge_date: Option<NaiveDate>,
    pub discharge_notes: Option<String>,
}

impl Allotment {
    pub fn is_open(&self) -> bool {
        self.discharge_date.is_none()
    }
}

/// Open allotment joined with its ward/room/bed location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllotmentDetail {
    pub allotment: Allotment,
    pub ward_id: i64,
    pub ward_name: String,
    pub ward_type: WardType,
    pub floor_number: i32,
    pub room_id: i64,
    pub room_number: i32,
    pub bed_number: i32,
}
