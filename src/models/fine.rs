//! Fine model and late-return assessment

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::enums::FineStatus;
use crate::error::{AppError, AppResult};

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Fine model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub id: i32,
    pub loan_id: i32,
    pub member_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub reason: String,
    pub issue_date: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: FineStatus,
    pub notes: Option<String>,
}

impl Fine {
    fn transition(&self, next: FineStatus) -> AppResult<Fine> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                entity: "fine",
                id: self.id,
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        Ok(Fine {
            status: next,
            ..self.clone()
        })
    }

    pub fn paid(&self, at: DateTime<Utc>) -> AppResult<Fine> {
        let mut fine = self.transition(FineStatus::Paid)?;
        fine.payment_date = Some(at);
        Ok(fine)
    }

    pub fn waived(&self, notes: Option<String>) -> AppResult<Fine> {
        let mut fine = self.transition(FineStatus::Waived)?;
        if notes.is_some() {
            fine.notes = notes;
        }
        Ok(fine)
    }

    pub fn is_pending(&self) -> bool {
        self.status == FineStatus::Pending
    }
}

/// Lateness of a return and the fee it incurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateFee {
    pub days_late: i64,
    pub amount: Decimal,
}

impl LateFee {
    /// Assess a return at `returned` against `due`. Any lateness counts as at
    /// least one day; partial days round up.
    pub fn assess(due: DateTime<Utc>, returned: DateTime<Utc>, daily_rate: Decimal) -> Option<LateFee> {
        if returned <= due {
            return None;
        }
        let late_millis = (returned - due).num_milliseconds();
        let days_late = ((late_millis + DAY_MILLIS - 1) / DAY_MILLIS).max(1);
        let amount = (Decimal::from(days_late) * daily_rate).round_dp(2);
        Some(LateFee { days_late, amount })
    }

    pub fn reason(&self) -> String {
        format!("Late return ({} day(s))", self.days_late)
    }
}

/// Fine draft handed to the store; new fines always start pending
#[derive(Debug, Clone, PartialEq)]
pub struct NewFine {
    pub loan_id: i32,
    pub member_id: i32,
    pub amount: Decimal,
    pub reason: String,
    pub issue_date: DateTime<Utc>,
    pub notes: Option<String>,
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    Ok(())
}

/// Manual fine request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFine {
    pub loan_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    #[validate(custom(function = "validate_amount"))]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,
    pub issue_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Payment request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PayFine {
    /// Defaults to now
    pub payment_date: Option<DateTime<Utc>>,
}

/// Waiver request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WaiveFine {
    pub notes: Option<String>,
}

/// Query parameters for fines
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct FineQuery {
    pub member_id: Option<i32>,
    pub loan_id: Option<i32>,
    pub status: Option<FineStatus>,
}

impl FineQuery {
    /// Pending fines of one loan
    pub fn pending_for_loan(loan_id: i32) -> Self {
        Self {
            loan_id: Some(loan_id),
            status: Some(FineStatus::Pending),
            ..Default::default()
        }
    }

    pub fn matches(&self, fine: &Fine) -> bool {
        self.member_id.map_or(true, |id| fine.member_id == id)
            && self.loan_id.map_or(true, |id| fine.loan_id == id)
            && self.status.map_or(true, |status| fine.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn rate() -> Decimal {
        Decimal::new(200, 2)
    }

    #[test]
    fn test_three_days_late() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let returned = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        let fee = LateFee::assess(due, returned, rate()).unwrap();
        assert_eq!(fee.days_late, 3);
        assert_eq!(fee.amount, Decimal::new(600, 2));
        assert_eq!(fee.reason(), "Late return (3 day(s))");
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let fee = LateFee::assess(due, due + Duration::minutes(5), rate()).unwrap();
        assert_eq!(fee.days_late, 1);
        let fee = LateFee::assess(due, due + Duration::hours(49), rate()).unwrap();
        assert_eq!(fee.days_late, 3);
    }

    #[test]
    fn test_on_time_is_free() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(LateFee::assess(due, due, rate()).is_none());
        assert!(LateFee::assess(due, due - Duration::days(2), rate()).is_none());
    }

    #[test]
    fn test_amount_rounds_to_cents() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let fee = LateFee::assess(due, due + Duration::days(3), Decimal::new(3333, 3)).unwrap();
        assert_eq!(fee.amount, Decimal::new(1000, 2));
    }
}
