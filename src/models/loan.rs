//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{book::Book, enums::LoanStatus, fine::Fine};
use crate::error::{AppError, AppResult};

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    /// Employee who handed the copy over
    pub employee_id: i32,
    /// Set when the loan was converted from a reservation
    pub reservation_id: Option<i32>,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: LoanStatus,
    pub notes: Option<String>,
}

impl Loan {
    fn transition(&self, next: LoanStatus) -> AppResult<Loan> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                entity: "loan",
                id: self.id,
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        Ok(Loan {
            status: next,
            ..self.clone()
        })
    }

    /// The loan closed at `at`
    pub fn returned(&self, at: DateTime<Utc>) -> AppResult<Loan> {
        let mut loan = self.transition(LoanStatus::Returned)?;
        loan.return_date = Some(at);
        Ok(loan)
    }

    pub fn overdue(&self) -> AppResult<Loan> {
        self.transition(LoanStatus::Overdue)
    }

    pub fn is_returned(&self) -> bool {
        self.status == LoanStatus::Returned
    }

    /// Still active and past its due date at `now`
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Active && now > self.due_date
    }

    /// Apply an edit of non-lifecycle fields
    pub fn with_edit(&self, edit: &UpdateLoan) -> Loan {
        let mut loan = self.clone();
        if let Some(due_date) = edit.due_date {
            loan.due_date = due_date;
        }
        if edit.notes.is_some() {
            loan.notes = edit.notes.clone();
        }
        loan
    }
}

/// Loan draft handed to the store, which assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub book_id: i32,
    pub member_id: i32,
    pub employee_id: i32,
    pub reservation_id: Option<i32>,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Issue loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct IssueLoan {
    pub book_id: i32,
    pub member_id: i32,
    pub employee_id: i32,
    /// Defaults to the configured loan duration from now
    pub due_date: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// Issue even when no copy is available
    #[serde(default)]
    pub force: bool,
}

/// Loan edit request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLoan {
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: Option<LoanStatus>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Return request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnLoan {
    /// Defaults to now
    pub return_date: Option<DateTime<Utc>>,
}

/// Query parameters for loans
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    pub member_id: Option<i32>,
    pub book_id: Option<i32>,
    pub status: Option<LoanStatus>,
}

impl LoanQuery {
    pub fn matches(&self, loan: &Loan) -> bool {
        self.member_id.map_or(true, |id| loan.member_id == id)
            && self.book_id.map_or(true, |id| loan.book_id == id)
            && self.status.map_or(true, |status| loan.status == status)
    }
}

/// Entities touched by a return
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub loan: Loan,
    /// Book after its copy was restored
    pub book: Option<Book>,
    /// Late-return fine created by this return
    pub fine: Option<Fine>,
    /// True when the loan had already been returned and nothing changed
    pub already_returned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn loan(status: LoanStatus) -> Loan {
        Loan {
            id: 7,
            book_id: 1,
            member_id: 2,
            employee_id: 1,
            reservation_id: None,
            loan_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            due_date: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            return_date: None,
            status,
            notes: None,
        }
    }

    #[test]
    fn test_return_sets_date_once() {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let returned = loan(LoanStatus::Active).returned(at).unwrap();
        assert_eq!(returned.status, LoanStatus::Returned);
        assert_eq!(returned.return_date, Some(at));

        let again = returned.returned(at);
        assert!(matches!(again, Err(AppError::InvalidTransition { .. })));
    }

    #[test]
    fn test_overdue_loan_can_be_returned() {
        let overdue = loan(LoanStatus::Active).overdue().unwrap();
        assert!(overdue.returned(Utc::now()).is_ok());
    }

    #[test]
    fn test_past_due_only_for_active() {
        let after = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(loan(LoanStatus::Active).is_past_due(after));
        assert!(!loan(LoanStatus::Overdue).is_past_due(after));
        assert!(!loan(LoanStatus::Active).is_past_due(loan(LoanStatus::Active).due_date));
    }
}
