//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// IssueStatus
// ---------------------------------------------------------------------------

/// Issue record lifecycle states.
///
/// Transitions move forward only: PENDING → {ISSUED, REJECTED},
/// ISSUED → {RETURNED, OVERDUE, LOST}, OVERDUE → {RETURNED, LOST}.
/// RETURNED, REJECTED and LOST are terminal. OVERDUE is never written to
/// storage; it is computed at read time from the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum IssueStatus {
    Pending = 0,
    Issued = 1,
    Overdue = 2,
    Returned = 3,
    Rejected = 4,
    Lost = 5,
}

impl From<i16> for IssueStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => IssueStatus::Issued,
            2 => IssueStatus::Overdue,
            3 => IssueStatus::Returned,
            4 => IssueStatus::Rejected,
            5 => IssueStatus::Lost,
            _ => IssueStatus::Pending,
        }
    }
}

impl From<IssueStatus> for i16 {
    fn from(s: IssueStatus) -> Self {
        s as i16
    }
}

impl IssueStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IssueStatus::Returned | IssueStatus::Rejected | IssueStatus::Lost
        )
    }

    /// States that hold a physical copy out of circulation.
    pub fn holds_copy(&self) -> bool {
        matches!(self, IssueStatus::Issued | IssueStatus::Overdue)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: IssueStatus) -> bool {
        use IssueStatus::*;
        matches!(
            (*self, next),
            (Pending, Issued)
                | (Pending, Rejected)
                | (Issued, Returned)
                | (Issued, Overdue)
                | (Issued, Lost)
                | (Overdue, Returned)
                | (Overdue, Lost)
        )
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IssueStatus::Pending => "PENDING",
            IssueStatus::Issued => "ISSUED",
            IssueStatus::Overdue => "OVERDUE",
            IssueStatus::Returned => "RETURNED",
            IssueStatus::Rejected => "REJECTED",
            IssueStatus::Lost => "LOST",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// FineStatus
// ---------------------------------------------------------------------------

/// Fine record states. PAID and WAIVED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum FineStatus {
    Pending = 0,
    Paid = 1,
    Waived = 2,
}

impl From<i16> for FineStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => FineStatus::Paid,
            2 => FineStatus::Waived,
            _ => FineStatus::Pending,
        }
    }
}

impl From<FineStatus> for i16 {
    fn from(s: FineStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for FineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FineStatus::Pending => "PENDING",
            FineStatus::Paid => "PAID",
            FineStatus::Waived => "WAIVED",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// User roles for authorization gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum Role {
    User = 0,
    Librarian = 1,
    Admin = 2,
}

impl From<i16> for Role {
    fn from(v: i16) -> Self {
        match v {
            1 => Role::Librarian,
            2 => Role::Admin,
            _ => Role::User,
        }
    }
}

impl From<Role> for i16 {
    fn from(r: Role) -> Self {
        r as i16
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Role::User => "USER",
            Role::Librarian => "LIBRARIAN",
            Role::Admin => "ADMIN",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_legal() {
        assert!(IssueStatus::Pending.can_transition_to(IssueStatus::Issued));
        assert!(IssueStatus::Pending.can_transition_to(IssueStatus::Rejected));
        assert!(IssueStatus::Issued.can_transition_to(IssueStatus::Returned));
        assert!(IssueStatus::Issued.can_transition_to(IssueStatus::Lost));
        assert!(IssueStatus::Overdue.can_transition_to(IssueStatus::Returned));
        assert!(IssueStatus::Overdue.can_transition_to(IssueStatus::Lost));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [IssueStatus::Returned, IssueStatus::Rejected, IssueStatus::Lost] {
            assert!(terminal.is_terminal());
            for next in [
                IssueStatus::Pending,
                IssueStatus::Issued,
                IssueStatus::Overdue,
                IssueStatus::Returned,
                IssueStatus::Rejected,
                IssueStatus::Lost,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_backward_transitions() {
        assert!(!IssueStatus::Issued.can_transition_to(IssueStatus::Pending));
        assert!(!IssueStatus::Overdue.can_transition_to(IssueStatus::Issued));
        assert!(!IssueStatus::Returned.can_transition_to(IssueStatus::Issued));
        // Rejection is only a short-circuit out of PENDING
        assert!(!IssueStatus::Issued.can_transition_to(IssueStatus::Rejected));
    }

    #[test]
    fn status_roundtrips_through_db_codes() {
        for s in [
            IssueStatus::Pending,
            IssueStatus::Issued,
            IssueStatus::Overdue,
            IssueStatus::Returned,
            IssueStatus::Rejected,
            IssueStatus::Lost,
        ] {
            assert_eq!(IssueStatus::from(i16::from(s)), s);
        }
    }
}
