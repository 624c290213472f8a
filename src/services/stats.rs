//! Circulation statistics service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        book::BookQuery,
        enums::{FineStatus, LoanStatus, ReservationStatus},
        fine::{Fine, FineQuery},
        loan::{Loan, LoanQuery},
        reservation::ReservationQuery,
    },
    repository::Repository,
};

/// Library-wide circulation figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryStats {
    pub titles: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub pending_reservations: i64,
    pub confirmed_reservations: i64,
    pub pending_fines: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub pending_fines_total: Decimal,
}

/// One member's circulation figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberSummary {
    pub member_id: i32,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub open_reservations: i64,
    pub pending_fines: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub pending_fines_total: Decimal,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

fn is_overdue(loan: &Loan, now: DateTime<Utc>) -> bool {
    loan.status == LoanStatus::Overdue || loan.is_past_due(now)
}

fn count<T>(items: &[T], pred: impl Fn(&T) -> bool) -> i64 {
    items.iter().filter(|i| pred(*i)).count() as i64
}

fn pending_total(fines: &[Fine]) -> Decimal {
    fines
        .iter()
        .filter(|f| f.status == FineStatus::Pending)
        .map(|f| f.amount)
        .sum()
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn library(&self, now: DateTime<Utc>) -> AppResult<LibraryStats> {
        let books = self.repository.books.list(&BookQuery::default()).await?;
        let loans = self.repository.loans.list(&LoanQuery::default()).await?;
        let reservations = self.repository.reservations.list(&ReservationQuery::default()).await?;
        let fines = self.repository.fines.list(&FineQuery::default()).await?;

        Ok(LibraryStats {
            titles: books.len() as i64,
            total_copies: books.iter().map(|b| b.total_copies as i64).sum(),
            available_copies: books.iter().map(|b| b.available_copies as i64).sum(),
            active_loans: count(&loans, |l| l.status != LoanStatus::Returned),
            overdue_loans: count(&loans, |l| is_overdue(l, now)),
            pending_reservations: count(&reservations, |r| r.status == ReservationStatus::Pending),
            confirmed_reservations: count(&reservations, |r| r.status == ReservationStatus::Confirmed),
            pending_fines: count(&fines, |f| f.status == FineStatus::Pending),
            pending_fines_total: pending_total(&fines),
        })
    }

    pub async fn member(&self, member_id: i32, now: DateTime<Utc>) -> AppResult<MemberSummary> {
        let loans = self
            .repository
            .loans
            .list(&LoanQuery {
                member_id: Some(member_id),
                ..Default::default()
            })
            .await?;
        let reservations = self
            .repository
            .reservations
            .list(&ReservationQuery {
                member_id: Some(member_id),
                ..Default::default()
            })
            .await?;
        let fines = self
            .repository
            .fines
            .list(&FineQuery {
                member_id: Some(member_id),
                ..Default::default()
            })
            .await?;

        Ok(MemberSummary {
            member_id,
            active_loans: count(&loans, |l| l.status == LoanStatus::Active),
            overdue_loans: count(&loans, |l| is_overdue(l, now)),
            open_reservations: count(&reservations, |r| r.status.is_open()),
            pending_fines: count(&fines, |f| f.status == FineStatus::Pending),
            pending_fines_total: pending_total(&fines),
        })
    }
}
