use super::enums::{DiagnosisStatus, PatientStatus};

#[derive(Debug, Default)]
pub struct DiagnosisFilter {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub status: Option<DiagnosisStatus>,
}

#[derive(Debug, Default)]
pub struct PatientFilter {
    pub status: Option<PatientStatus>,
}

#[derive(Debug, Default)]
pub struct BedFilter {
    pub ward_id: Option<i64>,
    pub free_only: bool,
}
