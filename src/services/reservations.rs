//! Reservation management service

use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use super::copies::CopyLedger;
use crate::{
    error::{AppError, AppResult},
    models::{
        loan::NewLoan,
        reservation::{
            generate_group_code, ConvertReservation, CreateReservation, CreateReservationBatch,
            NewReservation, Reservation, ReservationLoan, ReservationQuery,
        },
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    copies: CopyLedger,
    hold_days: i64,
    loan_days: i64,
}

impl ReservationsService {
    pub fn new(repository: Repository, copies: CopyLedger, hold_days: i64, loan_days: i64) -> Self {
        Self {
            repository,
            copies,
            hold_days,
            loan_days,
        }
    }

    pub async fn list(&self, query: &ReservationQuery) -> AppResult<Vec<Reservation>> {
        self.repository.reservations.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        self.repository.reservations.get(id).await
    }

    fn draft(
        &self,
        book_id: i32,
        member_id: i32,
        expiration: Option<DateTime<Utc>>,
        group_code: Option<String>,
        now: DateTime<Utc>,
    ) -> NewReservation {
        NewReservation {
            book_id,
            member_id,
            reservation_date: now,
            expiration_date: expiration.unwrap_or_else(|| now + Duration::days(self.hold_days)),
            group_code,
        }
    }

    /// Create a pending reservation. No copy is held until it is confirmed.
    pub async fn create(&self, request: &CreateReservation) -> AppResult<Reservation> {
        request.validate()?;
        self.repository.books.get(request.book_id).await?;

        let draft = self.draft(
            request.book_id,
            request.member_id,
            request.expiration_date,
            None,
            Utc::now(),
        );
        let reservation = self.repository.reservations.create(&draft).await?;
        tracing::info!(
            reservation_id = reservation.id,
            book_id = reservation.book_id,
            member_id = reservation.member_id,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// Create one pending reservation per book, all sharing a group code
    pub async fn create_batch(&self, request: &CreateReservationBatch) -> AppResult<Vec<Reservation>> {
        request.validate()?;
        for book_id in &request.book_ids {
            self.repository.books.get(*book_id).await?;
        }

        let now = Utc::now();
        let code = generate_group_code(now);
        let mut created = Vec::with_capacity(request.book_ids.len());
        for book_id in &request.book_ids {
            let draft = self.draft(
                *book_id,
                request.member_id,
                request.expiration_date,
                Some(code.clone()),
                now,
            );
            created.push(self.repository.reservations.create(&draft).await?);
        }

        tracing::info!(group_code = %code, count = created.len(), "Reservation batch created");
        Ok(created)
    }

    /// Give back the copy a confirmed reservation was holding. A book
    /// deleted since confirmation has no count left to restore.
    async fn release_hold(&self, reservation: &Reservation) -> AppResult<()> {
        match self.copies.release(reservation.book_id).await {
            Ok(_) => Ok(()),
            Err(AppError::NotFound(_)) => {
                tracing::warn!(
                    reservation_id = reservation.id,
                    book_id = reservation.book_id,
                    "Reserved book no longer exists, no copy to release"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    reservation_id = reservation.id,
                    book_id = reservation.book_id,
                    "Reservation closed but copy release failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Confirm a pending reservation, holding one copy of its book
    pub async fn confirm(&self, id: i32) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get(id).await?;
        let confirmed = reservation.confirmed()?;

        self.copies.take_available(reservation.book_id).await?;

        match self
            .repository
            .reservations
            .update(&confirmed, reservation.status)
            .await
        {
            Ok(updated) => {
                tracing::info!(reservation_id = id, book_id = updated.book_id, "Reservation confirmed");
                Ok(updated)
            }
            Err(e) => {
                tracing::error!(reservation_id = id, "Confirmation not stored, releasing held copy: {}", e);
                if let Err(release_err) = self.copies.release(reservation.book_id).await {
                    tracing::error!(book_id = reservation.book_id, "Copy release failed: {}", release_err);
                }
                Err(e)
            }
        }
    }

    /// Cancel a reservation, giving back the copy a confirmed one was holding
    pub async fn cancel(&self, id: i32) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get(id).await?;
        let cancelled = reservation.cancelled()?;

        let updated = self
            .repository
            .reservations
            .update(&cancelled, reservation.status)
            .await?;
        if reservation.holds_copy() {
            self.release_hold(&reservation).await?;
        }

        tracing::info!(
            reservation_id = id,
            released = reservation.holds_copy(),
            "Reservation cancelled"
        );
        Ok(updated)
    }

    /// Delete a reservation, giving back the copy a confirmed one was holding
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let reservation = self.repository.reservations.get(id).await?;

        if reservation.holds_copy() {
            // Only the caller whose status write lands releases the hold
            let cancelled = reservation.cancelled()?;
            self.repository
                .reservations
                .update(&cancelled, reservation.status)
                .await?;
            self.release_hold(&reservation).await?;
        }

        self.repository.reservations.delete(id).await?;
        tracing::info!(reservation_id = id, "Reservation deleted");
        Ok(())
    }

    /// Hand over the copy held by a confirmed reservation as a loan.
    /// The copy was debited at confirmation, so the count is left alone.
    pub async fn convert_to_loan(&self, id: i32, request: &ConvertReservation) -> AppResult<ReservationLoan> {
        let reservation = self.repository.reservations.get(id).await?;
        let completed = reservation.completed()?;

        // Completed before the loan exists; a failed insert reopens it
        let completed = self
            .repository
            .reservations
            .update(&completed, reservation.status)
            .await?;

        let now = Utc::now();
        let draft = NewLoan {
            book_id: reservation.book_id,
            member_id: reservation.member_id,
            employee_id: request.employee_id,
            reservation_id: Some(reservation.id),
            loan_date: now,
            due_date: request
                .due_date
                .unwrap_or_else(|| now + Duration::days(self.loan_days)),
            notes: None,
        };

        let loan = match self.repository.loans.create(&draft).await {
            Ok(loan) => loan,
            Err(e) => {
                tracing::error!(reservation_id = id, "Loan creation failed, reopening reservation: {}", e);
                if let Err(revert_err) = self
                    .repository
                    .reservations
                    .update(&reservation, completed.status)
                    .await
                {
                    tracing::error!(reservation_id = id, "Reservation reopen failed: {}", revert_err);
                }
                return Err(e);
            }
        };

        tracing::info!(reservation_id = id, loan_id = loan.id, "Reservation converted to loan");
        Ok(ReservationLoan {
            reservation: completed,
            loan,
        })
    }

    /// Expire open reservations past their expiration date, releasing held copies
    pub async fn expire(&self, now: DateTime<Utc>) -> AppResult<Vec<Reservation>> {
        let all = self.repository.reservations.list(&ReservationQuery::default()).await?;

        let mut expired = Vec::new();
        for reservation in all.iter().filter(|r| r.is_lapsed(now)) {
            let lapsed = reservation.expired()?;
            match self
                .repository
                .reservations
                .update(&lapsed, reservation.status)
                .await
            {
                Ok(updated) => {
                    if reservation.holds_copy() {
                        self.release_hold(reservation).await?;
                    }
                    expired.push(updated);
                }
                Err(AppError::StaleVersion(msg)) => {
                    tracing::debug!(reservation_id = reservation.id, "Reservation changed during expiry sweep: {}", msg);
                }
                Err(e) => return Err(e),
            }
        }

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Reservations expired");
        }
        Ok(expired)
    }
}
