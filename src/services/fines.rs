//! Fine management service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        fine::{CreateFine, Fine, FineQuery, LateFee, NewFine},
        loan::Loan,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
    daily_rate: Decimal,
}

impl FinesService {
    pub fn new(repository: Repository, daily_rate: Decimal) -> Self {
        Self {
            repository,
            daily_rate,
        }
    }

    pub async fn list(&self, query: &FineQuery) -> AppResult<Vec<Fine>> {
        self.repository.fines.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Fine> {
        self.repository.fines.get(id).await
    }

    async fn pending_for_loan(&self, loan_id: i32) -> AppResult<Option<Fine>> {
        let pending = self
            .repository
            .fines
            .list(&FineQuery::pending_for_loan(loan_id))
            .await?;
        Ok(pending.into_iter().next())
    }

    /// Fine a returned loan for lateness, unless it is on time or already
    /// carries a pending fine
    pub async fn assess_late_return(&self, loan: &Loan) -> AppResult<Option<Fine>> {
        let Some(returned_at) = loan.return_date else {
            return Ok(None);
        };
        let Some(fee) = LateFee::assess(loan.due_date, returned_at, self.daily_rate) else {
            return Ok(None);
        };

        if let Some(existing) = self.pending_for_loan(loan.id).await? {
            tracing::debug!(
                loan_id = loan.id,
                fine_id = existing.id,
                "Pending fine already exists, not fining again"
            );
            return Ok(None);
        }

        let fine = self
            .repository
            .fines
            .create(&NewFine {
                loan_id: loan.id,
                member_id: loan.member_id,
                amount: fee.amount,
                reason: fee.reason(),
                issue_date: returned_at,
                notes: None,
            })
            .await?;

        tracing::info!(
            loan_id = loan.id,
            fine_id = fine.id,
            days_late = fee.days_late,
            amount = %fine.amount,
            "Late return fine issued"
        );
        Ok(Some(fine))
    }

    /// Record a fine by hand against a loan
    pub async fn create(&self, data: &CreateFine) -> AppResult<Fine> {
        data.validate()?;
        let loan = self.repository.loans.get(data.loan_id).await?;

        if self.pending_for_loan(loan.id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Loan {} already has a pending fine",
                loan.id
            )));
        }

        let fine = self
            .repository
            .fines
            .create(&NewFine {
                loan_id: loan.id,
                member_id: loan.member_id,
                amount: data.amount.round_dp(2),
                reason: data.reason.clone(),
                issue_date: data.issue_date.unwrap_or_else(Utc::now),
                notes: data.notes.clone(),
            })
            .await?;

        tracing::info!(loan_id = loan.id, fine_id = fine.id, "Manual fine recorded");
        Ok(fine)
    }

    pub async fn pay(&self, id: i32, at: Option<DateTime<Utc>>) -> AppResult<Fine> {
        let fine = self.repository.fines.get(id).await?;
        let paid = fine.paid(at.unwrap_or_else(Utc::now))?;
        let fine = self.repository.fines.update(&paid).await?;
        tracing::info!(fine_id = id, "Fine paid");
        Ok(fine)
    }

    pub async fn waive(&self, id: i32, notes: Option<String>) -> AppResult<Fine> {
        let fine = self.repository.fines.get(id).await?;
        let waived = fine.waived(notes)?;
        let fine = self.repository.fines.update(&waived).await?;
        tracing::info!(fine_id = id, "Fine waived");
        Ok(fine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        enums::{FineStatus, LoanStatus},
        loan::NewLoan,
    };
    use chrono::TimeZone;

    async fn returned_loan(repository: &Repository, due_day: u32, return_day: u32) -> Loan {
        let loan = repository
            .loans
            .create(&NewLoan {
                book_id: 1,
                member_id: 5,
                employee_id: 1,
                reservation_id: None,
                loan_date: Utc.with_ymd_and_hms(2023, 12, 20, 0, 0, 0).unwrap(),
                due_date: Utc.with_ymd_and_hms(2024, 1, due_day, 0, 0, 0).unwrap(),
                notes: None,
            })
            .await
            .unwrap();
        let returned = loan
            .returned(Utc.with_ymd_and_hms(2024, 1, return_day, 0, 0, 0).unwrap())
            .unwrap();
        repository.loans.update(&returned, LoanStatus::Active).await.unwrap()
    }

    #[tokio::test]
    async fn test_manual_fine_blocked_by_pending() {
        let repository = Repository::in_memory();
        let service = FinesService::new(repository.clone(), Decimal::new(200, 2));
        let loan = returned_loan(&repository, 1, 4).await;
        service.assess_late_return(&loan).await.unwrap().unwrap();

        let manual = CreateFine {
            loan_id: loan.id,
            amount: Decimal::new(1500, 2),
            reason: "Damaged cover".to_string(),
            issue_date: None,
            notes: None,
        };
        assert!(matches!(service.create(&manual).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_pay_then_fine_again_allowed() {
        let repository = Repository::in_memory();
        let service = FinesService::new(repository.clone(), Decimal::new(200, 2));
        let loan = returned_loan(&repository, 1, 4).await;
        let fine = service.assess_late_return(&loan).await.unwrap().unwrap();

        let paid = service.pay(fine.id, None).await.unwrap();
        assert_eq!(paid.status, FineStatus::Paid);
        assert!(paid.payment_date.is_some());
        assert!(matches!(
            service.waive(fine.id, None).await,
            Err(AppError::InvalidTransition { .. })
        ));

        let manual = CreateFine {
            loan_id: loan.id,
            amount: Decimal::new(1500, 2),
            reason: "Damaged cover".to_string(),
            issue_date: None,
            notes: None,
        };
        let second = service.create(&manual).await.unwrap();
        assert_eq!(second.member_id, 5);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let repository = Repository::in_memory();
        let service = FinesService::new(repository.clone(), Decimal::new(200, 2));
        let loan = returned_loan(&repository, 10, 4).await;
        let manual = CreateFine {
            loan_id: loan.id,
            amount: Decimal::ZERO,
            reason: "Nothing".to_string(),
            issue_date: None,
            notes: None,
        };
        assert!(matches!(service.create(&manual).await, Err(AppError::Validation(_))));
    }
}
