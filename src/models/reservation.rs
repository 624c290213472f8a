//! Reservation model and related types

use chrono::{DateTime, Datelike, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{enums::ReservationStatus, loan::Loan};
use crate::error::{AppError, AppResult};

/// Reservation model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub reservation_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: ReservationStatus,
    pub notified: bool,
    /// Shared by reservations created together in one batch
    pub group_code: Option<String>,
}

impl Reservation {
    fn transition(&self, next: ReservationStatus) -> AppResult<Reservation> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                entity: "reservation",
                id: self.id,
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        Ok(Reservation {
            status: next,
            ..self.clone()
        })
    }

    pub fn confirmed(&self) -> AppResult<Reservation> {
        self.transition(ReservationStatus::Confirmed)
    }

    pub fn cancelled(&self) -> AppResult<Reservation> {
        self.transition(ReservationStatus::Cancelled)
    }

    pub fn completed(&self) -> AppResult<Reservation> {
        self.transition(ReservationStatus::Completed)
    }

    pub fn expired(&self) -> AppResult<Reservation> {
        self.transition(ReservationStatus::Expired)
    }

    pub fn holds_copy(&self) -> bool {
        self.status.holds_copy()
    }

    /// Open and past its expiration date at `now`
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && now > self.expiration_date
    }
}

/// Generate a batch code of the form `RES-YYYYMMDD-XXXX`
pub fn generate_group_code(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!(
        "RES-{:04}{:02}{:02}-{}",
        now.year(),
        now.month(),
        now.day(),
        suffix
    )
}

/// Reservation draft handed to the store, which assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub book_id: i32,
    pub member_id: i32,
    pub reservation_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub group_code: Option<String>,
}

/// Create reservation request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReservation {
    pub book_id: i32,
    pub member_id: i32,
    /// Defaults to the configured hold period from now
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Reserve several books at once for one member
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReservationBatch {
    pub member_id: i32,
    #[validate(length(min = 1, message = "At least one book is required"))]
    pub book_ids: Vec<i32>,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Convert a confirmed reservation into a loan
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConvertReservation {
    pub employee_id: i32,
    pub due_date: Option<DateTime<Utc>>,
}

/// Query parameters for reservations
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReservationQuery {
    pub member_id: Option<i32>,
    pub book_id: Option<i32>,
    pub status: Option<ReservationStatus>,
    pub group_code: Option<String>,
}

impl ReservationQuery {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.member_id.map_or(true, |id| reservation.member_id == id)
            && self.book_id.map_or(true, |id| reservation.book_id == id)
            && self.status.map_or(true, |status| reservation.status == status)
            && self
                .group_code
                .as_ref()
                .map_or(true, |code| reservation.group_code.as_ref() == Some(code))
    }
}

/// Reservation completed into a loan
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationLoan {
    pub reservation: Reservation,
    pub loan: Loan,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_group_code_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let code = generate_group_code(now);
        assert!(code.starts_with("RES-20240309-"));
        let suffix = &code["RES-20240309-".len()..];
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_query_matches_group() {
        let now = Utc::now();
        let reservation = Reservation {
            id: 1,
            book_id: 3,
            member_id: 9,
            reservation_date: now,
            expiration_date: now,
            status: ReservationStatus::Pending,
            notified: false,
            group_code: Some("RES-20240309-AB12".to_string()),
        };
        let query = ReservationQuery {
            group_code: Some("RES-20240309-AB12".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&reservation));
        let other = ReservationQuery {
            member_id: Some(10),
            ..Default::default()
        };
        assert!(!other.matches(&reservation));
    }
}
