//! Lifecycle status enums and their transition tables

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Raised when a stored status string matches no known variant
#[derive(Debug, Error)]
#[error("unknown {kind} status '{value}'")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        }
    }

    /// Whether `self -> next` is a legal loan transition
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        match (self, next) {
            (Active, Overdue) | (Active, Returned) => true,
            // Extending the due date of an overdue loan puts it back in circulation
            (Overdue, Active) | (Overdue, Returned) => true,
            (Returned, _) => false,
            (Active, Active) | (Overdue, Overdue) => false,
        }
    }
}

impl TryFrom<String> for LoanStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(LoanStatus::Active),
            "returned" => Ok(LoanStatus::Returned),
            "overdue" => Ok(LoanStatus::Overdue),
            _ => Err(UnknownStatus { kind: "loan", value }),
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReservationStatus
// ---------------------------------------------------------------------------

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Expired => "expired",
        }
    }

    /// Whether `self -> next` is a legal reservation transition
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        match (self, next) {
            (Pending, Confirmed) | (Pending, Cancelled) | (Pending, Expired) => true,
            (Confirmed, Completed) | (Confirmed, Cancelled) | (Confirmed, Expired) => true,
            (Pending, _) | (Confirmed, _) => false,
            (Completed, _) | (Cancelled, _) | (Expired, _) => false,
        }
    }

    /// A confirmed reservation holds one debited copy of its book
    pub fn holds_copy(self) -> bool {
        self == ReservationStatus::Confirmed
    }

    pub fn is_open(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }
}

impl TryFrom<String> for ReservationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            "expired" => Ok(ReservationStatus::Expired),
            _ => Err(UnknownStatus { kind: "reservation", value }),
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FineStatus
// ---------------------------------------------------------------------------

/// Fine settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FineStatus {
    Pending,
    Paid,
    Waived,
}

impl FineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FineStatus::Pending => "pending",
            FineStatus::Paid => "paid",
            FineStatus::Waived => "waived",
        }
    }

    pub fn can_transition_to(self, next: FineStatus) -> bool {
        matches!(
            (self, next),
            (FineStatus::Pending, FineStatus::Paid) | (FineStatus::Pending, FineStatus::Waived)
        )
    }
}

impl TryFrom<String> for FineStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(FineStatus::Pending),
            "paid" => Ok(FineStatus::Paid),
            "waived" => Ok(FineStatus::Waived),
            _ => Err(UnknownStatus { kind: "fine", value }),
        }
    }
}

impl std::fmt::Display for FineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returned_loan_is_terminal() {
        for next in [LoanStatus::Active, LoanStatus::Overdue, LoanStatus::Returned] {
            assert!(!LoanStatus::Returned.can_transition_to(next));
        }
        assert!(LoanStatus::Overdue.can_transition_to(LoanStatus::Returned));
    }

    #[test]
    fn test_reservation_table() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Confirmed));
        for terminal in [Completed, Cancelled, Expired] {
            assert!(!terminal.can_transition_to(Cancelled));
            assert!(!terminal.is_open());
        }
        assert!(Confirmed.holds_copy());
        assert!(!Pending.holds_copy());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(
            ReservationStatus::try_from("cancelled".to_string()).unwrap(),
            ReservationStatus::Cancelled
        );
        assert!(FineStatus::try_from("refunded".to_string()).is_err());
        assert_eq!(LoanStatus::Overdue.to_string(), "overdue");
    }
}
