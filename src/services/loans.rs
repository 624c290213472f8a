//! Loan management service

use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use super::{copies::CopyLedger, fines::FinesService};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanStatus,
        loan::{IssueLoan, Loan, LoanQuery, NewLoan, ReturnOutcome, UpdateLoan},
    },
    repository::Repository,
};

/// Attempts made on a loan status write that lost a race
const STATUS_RACE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    copies: CopyLedger,
    fines: FinesService,
    loan_days: i64,
}

impl LoansService {
    pub fn new(repository: Repository, copies: CopyLedger, fines: FinesService, loan_days: i64) -> Self {
        Self {
            repository,
            copies,
            fines,
            loan_days,
        }
    }

    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        self.repository.loans.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        self.repository.loans.get(id).await
    }

    /// Issue a loan and debit one copy of the book.
    ///
    /// Without `force`, a book with no available copy is refused. With it the
    /// loan is created anyway and the count stays clamped at zero.
    pub async fn issue(&self, request: &IssueLoan) -> AppResult<Loan> {
        request.validate()?;
        let now = Utc::now();

        let book = if request.force {
            self.copies.take(request.book_id).await?
        } else {
            self.copies.take_available(request.book_id).await?
        };

        let draft = NewLoan {
            book_id: book.id,
            member_id: request.member_id,
            employee_id: request.employee_id,
            reservation_id: None,
            loan_date: now,
            due_date: request
                .due_date
                .unwrap_or_else(|| now + Duration::days(self.loan_days)),
            notes: request.notes.clone(),
        };

        let loan = match self.repository.loans.create(&draft).await {
            Ok(loan) => loan,
            Err(e) => {
                tracing::error!(book_id = book.id, "Loan creation failed, releasing debited copy: {}", e);
                if let Err(release_err) = self.copies.release(book.id).await {
                    tracing::error!(book_id = book.id, "Copy release failed: {}", release_err);
                }
                return Err(e);
            }
        };

        tracing::info!(
            loan_id = loan.id,
            book_id = loan.book_id,
            member_id = loan.member_id,
            forced = request.force,
            "Loan issued"
        );
        Ok(loan)
    }

    /// Record the return of a loan.
    ///
    /// The loan is closed first, then its copy is restored and finally a late
    /// fine is assessed. Returning an already returned loan changes nothing,
    /// and of two overlapping returns only the one that closes the loan
    /// restores the copy.
    pub async fn record_return(&self, loan_id: i32, at: Option<DateTime<Utc>>) -> AppResult<ReturnOutcome> {
        let at = at.unwrap_or_else(Utc::now);
        let mut loan = self.repository.loans.get(loan_id).await?;
        let mut attempt = 1;

        let loan = loop {
            if loan.is_returned() {
                tracing::debug!(loan_id, "Loan already returned, nothing to do");
                return Ok(ReturnOutcome {
                    loan,
                    book: None,
                    fine: None,
                    already_returned: true,
                });
            }

            let returned = loan.returned(at)?;
            match self.repository.loans.update(&returned, loan.status).await {
                Ok(closed) => break closed,
                // Moved between active and overdue meanwhile; read it again
                Err(AppError::StaleVersion(msg)) if attempt < STATUS_RACE_ATTEMPTS => {
                    tracing::debug!(loan_id, attempt, "Loan changed during return: {}", msg);
                    attempt += 1;
                    loan = self.repository.loans.get(loan_id).await?;
                }
                Err(e) => return Err(e),
            }
        };

        let book = match self.copies.release(loan.book_id).await {
            Ok(book) => Some(book),
            Err(AppError::NotFound(_)) => {
                tracing::warn!(loan_id, book_id = loan.book_id, "Returned loan's book no longer exists");
                None
            }
            Err(e) => {
                tracing::error!(
                    loan_id,
                    book_id = loan.book_id,
                    "Loan marked returned but copy restore failed: {}",
                    e
                );
                return Err(e);
            }
        };

        let fine = self.fines.assess_late_return(&loan).await.map_err(|e| {
            tracing::error!(loan_id, "Loan returned and copy restored but fine assessment failed: {}", e);
            e
        })?;

        tracing::info!(loan_id, book_id = loan.book_id, fined = fine.is_some(), "Loan returned");
        Ok(ReturnOutcome {
            loan,
            book,
            fine,
            already_returned: false,
        })
    }

    /// Edit a loan. Moving it to `returned` goes through [`Self::record_return`];
    /// on a loan that is already returned only the return date can be corrected.
    pub async fn update(&self, id: i32, edit: &UpdateLoan) -> AppResult<Loan> {
        edit.validate()?;
        let current = self.repository.loans.get(id).await?;

        if current.is_returned() {
            if let Some(status) = edit.status.filter(|s| *s != LoanStatus::Returned) {
                return Err(AppError::InvalidTransition {
                    entity: "loan",
                    id,
                    from: current.status.to_string(),
                    to: status.to_string(),
                });
            }
            let mut corrected = current.with_edit(edit);
            if edit.return_date.is_some() {
                corrected.return_date = edit.return_date;
            }
            return self.repository.loans.update(&corrected, current.status).await;
        }

        if edit.return_date.is_some() && edit.status != Some(LoanStatus::Returned) {
            return Err(AppError::Validation(
                "return_date can only be set together with status 'returned'".to_string(),
            ));
        }

        let edited = current.with_edit(edit);
        match edit.status {
            Some(LoanStatus::Returned) => {
                if edited != current {
                    self.repository.loans.update(&edited, current.status).await?;
                }
                Ok(self.record_return(id, edit.return_date).await?.loan)
            }
            Some(status) if status != current.status => {
                if !current.status.can_transition_to(status) {
                    return Err(AppError::InvalidTransition {
                        entity: "loan",
                        id,
                        from: current.status.to_string(),
                        to: status.to_string(),
                    });
                }
                let moved = Loan { status, ..edited };
                self.repository.loans.update(&moved, current.status).await
            }
            _ => self.repository.loans.update(&edited, current.status).await,
        }
    }

    /// Flag every active loan whose due date has passed as overdue
    pub async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Loan>> {
        let active = self
            .repository
            .loans
            .list(&LoanQuery {
                status: Some(LoanStatus::Active),
                ..Default::default()
            })
            .await?;

        let mut flagged = Vec::new();
        for loan in active.iter().filter(|l| l.is_past_due(now)) {
            match self.repository.loans.update(&loan.overdue()?, LoanStatus::Active).await {
                Ok(overdue) => flagged.push(overdue),
                Err(AppError::StaleVersion(msg)) => {
                    tracing::debug!(loan_id = loan.id, "Loan changed during overdue sweep: {}", msg);
                }
                Err(e) => return Err(e),
            }
        }

        if !flagged.is_empty() {
            tracing::info!(count = flagged.len(), "Loans flagged overdue");
        }
        Ok(flagged)
    }
}
