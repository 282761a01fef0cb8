use serde::{Deserialize, Serialize};

use super::enums::WardType;

/// A hospital ward owns its rooms, which own their beds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ward {
    pub id: i64,
    pub name: String,
    pub ward_type: WardType,
    pub floor_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub ward_id: i64,
    pub room_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bed {
    pub id: i64,
    pub room_id: i64,
    pub bed_number: i32,
    pub is_occupied: bool,
}
