use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(PatientStatus {
    Active => "active",
    Deceased => "deceased",
    Discharged => "discharged",
    Inactive => "inactive",
});

str_enum!(DoctorStatus {
    Active => "active",
    OnLeave => "on_leave",
    Retired => "retired",
    Inactive => "inactive",
});

str_enum!(WardType {
    General => "general",
    SemiPrivate => "semi_private",
    Private => "private",
});

str_enum!(DiagnosisStatus {
    Ongoing => "ongoing",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(PrescriptionStatus {
    Active => "active",
    Inactive => "inactive",
});

str_enum!(TestStatus {
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl DiagnosisStatus {
    /// Legal transitions: ongoing is the only non-terminal state.
    pub fn can_transition_to(self, next: DiagnosisStatus) -> bool {
        matches!(
            (self, next),
            (DiagnosisStatus::Ongoing, DiagnosisStatus::Completed)
                | (DiagnosisStatus::Ongoing, DiagnosisStatus::Cancelled)
        )
    }
}

impl TestStatus {
    pub fn can_transition_to(self, next: TestStatus) -> bool {
        matches!(
            (self, next),
            (TestStatus::Pending, TestStatus::Completed)
                | (TestStatus::Pending, TestStatus::Cancelled)
        )
    }
}
