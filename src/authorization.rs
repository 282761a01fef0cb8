//! Caller authorization: "is this caller allowed to perform action X".
//!
//! Default-deny: a role must match an explicit rule to be allowed. The
//! API layer resolves the caller's role from its token before invoking
//! the core; this module only makes the allow/deny decision.

use serde::{Deserialize, Serialize};

/// Caller role, resolved upstream from the identity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Doctor,
    Staff,
    Patient,
}

/// Every action the core exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    // Allotment Manager
    CreateAllotment,
    DischargeAllotment,
    ViewAllotment,
    // Clinical Episode Composer
    CreateDiagnosis,
    UpdateDiagnosis,
    ViewEpisode,
    AttachTestResults,
    CancelTestPrescribed,
    // Persistence gateway CRUD
    ManagePatients,
    ManageDoctors,
    ManageDepartments,
    ManageMedicalTests,
    ManageWards,
    ViewOwnRecords,
}

/// Why the decision came out the way it did, for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// Admins may perform every action.
    AdminOverride,
    /// The role has an explicit rule for this action.
    RoleRule,
    /// No matching rule; denied.
    Denied,
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }
}

/// Decide whether `role` may perform `action`.
pub fn authorize(role: Role, action: Action) -> AccessDecision {
    if role == Role::Admin {
        return AccessDecision::allow(AccessReason::AdminOverride);
    }

    let allowed = match role {
        Role::Admin => unreachable!(),
        // Doctors run the clinical workflow and read admissions.
        Role::Doctor => matches!(
            action,
            Action::CreateDiagnosis
                | Action::UpdateDiagnosis
                | Action::ViewEpisode
                | Action::AttachTestResults
                | Action::CancelTestPrescribed
                | Action::ViewAllotment
        ),
        // Staff run admissions and the non-clinical registries.
        Role::Staff => matches!(
            action,
            Action::CreateAllotment
                | Action::DischargeAllotment
                | Action::ViewAllotment
                | Action::ManagePatients
                | Action::ManageWards
        ),
        // Patients only read what is theirs.
        Role::Patient => matches!(action, Action::ViewOwnRecords | Action::ViewEpisode),
    };

    if allowed {
        AccessDecision::allow(AccessReason::RoleRule)
    } else {
        AccessDecision::deny()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_allowed_everything() {
        for action in [
            Action::CreateAllotment,
            Action::CreateDiagnosis,
            Action::ManageDoctors,
            Action::ManageMedicalTests,
        ] {
            let decision = authorize(Role::Admin, action);
            assert!(decision.allowed);
            assert_eq!(decision.reason, AccessReason::AdminOverride);
        }
    }

    #[test]
    fn doctor_runs_clinical_workflow_but_not_admissions() {
        assert!(authorize(Role::Doctor, Action::CreateDiagnosis).allowed);
        assert!(authorize(Role::Doctor, Action::AttachTestResults).allowed);
        assert!(authorize(Role::Doctor, Action::ViewAllotment).allowed);
        assert!(!authorize(Role::Doctor, Action::CreateAllotment).allowed);
        assert!(!authorize(Role::Doctor, Action::ManageDoctors).allowed);
    }

    #[test]
    fn staff_run_admissions_but_not_clinical_writes() {
        assert!(authorize(Role::Staff, Action::CreateAllotment).allowed);
        assert!(authorize(Role::Staff, Action::DischargeAllotment).allowed);
        assert!(!authorize(Role::Staff, Action::CreateDiagnosis).allowed);
        assert!(!authorize(Role::Staff, Action::ManageMedicalTests).allowed);
    }

    #[test]
    fn patient_is_read_only() {
        assert!(authorize(Role::Patient, Action::ViewOwnRecords).allowed);
        assert!(authorize(Role::Patient, Action::ViewEpisode).allowed);
        for action in [
            Action::CreateAllotment,
            Action::CreateDiagnosis,
            Action::ManagePatients,
            Action::CancelTestPrescribed,
        ] {
            let decision = authorize(Role::Patient, action);
            assert!(!decision.allowed);
            assert_eq!(decision.reason, AccessReason::Denied);
        }
    }
}
