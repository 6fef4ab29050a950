//! Authorization policy
//!
//! One pure function decides every privileged action. Each [`Action`]
//! variant carries the ownership facts the decision needs, so callers
//! resolve entities first and the policy itself never touches storage.
//! The match on [`Role`] is exhaustive without a wildcard: a new role
//! does not compile until every rule says what it may do. Anything not
//! explicitly allowed is denied.

use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::jwt::Claims;
use crate::models::Role;

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// A privileged action together with the ownership facts it is judged
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create a class owned by `teacher_id`
    CreateClass { teacher_id: Uuid },
    /// Modify an existing class owned by `class_owner`
    ModifyClass { class_owner: Uuid },
    /// List classes (the timetable is readable by any signed-in user)
    ListClasses,
    /// Mark attendance in a class owned by `class_owner`
    MarkAttendance { class_owner: Uuid },
    /// Correct an attendance record in a class owned by `class_owner`
    CorrectAttendance { class_owner: Uuid },
    /// Read the attendance roster of a class owned by `class_owner`
    ReadClassRoster { class_owner: Uuid },
    /// Read the attendance history of `student_id`
    ReadStudentHistory { student_id: Uuid },
    /// Mint a check-in code for a class owned by `class_owner`
    MintCheckIn { class_owner: Uuid },
}

/// A class-scoped action named without its ownership facts, for
/// callers that know the class id but not yet who owns it. Resolved
/// into an [`Action`] once the owner is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassAction {
    Modify,
    MarkAttendance,
    CorrectAttendance,
    ReadRoster,
    MintCheckIn,
}

impl ClassAction {
    pub fn with_owner(self, class_owner: Uuid) -> Action {
        match self {
            ClassAction::Modify => Action::ModifyClass { class_owner },
            ClassAction::MarkAttendance => Action::MarkAttendance { class_owner },
            ClassAction::CorrectAttendance => Action::CorrectAttendance { class_owner },
            ClassAction::ReadRoster => Action::ReadClassRoster { class_owner },
            ClassAction::MintCheckIn => Action::MintCheckIn { class_owner },
        }
    }
}

fn allow_if(condition: bool) -> Decision {
    if condition { Decision::Allow } else { Decision::Deny }
}

/// Decide whether `claims` may perform `action`.
pub fn authorize(claims: &Claims, action: &Action) -> Decision {
    match claims.role {
        // Admins hold every grant the rules below hand out.
        Role::Admin => Decision::Allow,
        Role::Teacher => match action {
            Action::CreateClass { teacher_id } => allow_if(claims.sub == *teacher_id),
            Action::ModifyClass { class_owner }
            | Action::MarkAttendance { class_owner }
            | Action::CorrectAttendance { class_owner }
            | Action::ReadClassRoster { class_owner }
            | Action::MintCheckIn { class_owner } => allow_if(claims.sub == *class_owner),
            Action::ListClasses => Decision::Allow,
            // Teachers read attendance through their class rosters.
            Action::ReadStudentHistory { .. } => Decision::Deny,
        },
        Role::Student => match action {
            Action::ListClasses => Decision::Allow,
            Action::ReadStudentHistory { student_id } => allow_if(claims.sub == *student_id),
            Action::CreateClass { .. }
            | Action::ModifyClass { .. }
            | Action::MarkAttendance { .. }
            | Action::CorrectAttendance { .. }
            | Action::ReadClassRoster { .. }
            | Action::MintCheckIn { .. } => Decision::Deny,
        },
    }
}

/// Authorize or fail with [`ServiceError::Forbidden`].
pub fn ensure(claims: &Claims, action: &Action) -> ServiceResult<()> {
    match authorize(claims, action) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(ServiceError::Forbidden),
    }
}
