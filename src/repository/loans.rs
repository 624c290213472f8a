//! Loans repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::LoanStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanStatus,
        loan::{Loan, LoanQuery, NewLoan},
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn list(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE ($1::int IS NULL OR member_id = $1)
              AND ($2::int IS NULL OR book_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY due_date
            "#,
        )
        .bind(query.member_id)
        .bind(query.book_id)
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn get(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn create(&self, loan: &NewLoan) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                book_id, member_id, employee_id, reservation_id,
                loan_date, due_date, status, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, 'active', $7)
            RETURNING *
            "#,
        )
        .bind(loan.book_id)
        .bind(loan.member_id)
        .bind(loan.employee_id)
        .bind(loan.reservation_id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .bind(&loan.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(loan)
    }

    async fn update(&self, loan: &Loan, expected: LoanStatus) -> AppResult<Loan> {
        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET
                due_date = $3, return_date = $4, status = $5, notes = $6
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(expected.as_str())
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status.as_str())
        .bind(&loan.notes)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(loan) => Ok(loan),
            None => {
                let current = self.get(loan.id).await?;
                Err(AppError::StaleVersion(format!(
                    "loan {} is {}, update expected {}",
                    current.id, current.status, expected
                )))
            }
        }
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }
        Ok(())
    }
}
