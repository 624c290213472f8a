//! Fines repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::FineStore;
use crate::{
    error::{AppError, AppResult},
    models::fine::{Fine, FineQuery, NewFine},
};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FineStore for FinesRepository {
    async fn list(&self, query: &FineQuery) -> AppResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(
            r#"
            SELECT * FROM fines
            WHERE ($1::int IS NULL OR member_id = $1)
              AND ($2::int IS NULL OR loan_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY issue_date DESC, id
            "#,
        )
        .bind(query.member_id)
        .bind(query.loan_id)
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(fines)
    }

    async fn get(&self, id: i32) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    async fn create(&self, fine: &NewFine) -> AppResult<Fine> {
        let created = sqlx::query_as::<_, Fine>(
            r#"
            INSERT INTO fines (loan_id, member_id, amount, reason, issue_date, status, notes)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            RETURNING *
            "#,
        )
        .bind(fine.loan_id)
        .bind(fine.member_id)
        .bind(fine.amount)
        .bind(&fine.reason)
        .bind(fine.issue_date)
        .bind(&fine.notes)
        .fetch_one(&self.pool)
        .await;

        match created {
            Ok(fine) => Ok(fine),
            // fines_one_pending_per_loan
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("Loan {} already has a pending fine", fine.loan_id),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, fine: &Fine) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>(
            r#"
            UPDATE fines SET
                amount = $2, reason = $3, payment_date = $4, status = $5, notes = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(fine.id)
        .bind(fine.amount)
        .bind(&fine.reason)
        .bind(fine.payment_date)
        .bind(fine.status.as_str())
        .bind(&fine.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", fine.id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM fines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Fine with id {} not found", id)));
        }
        Ok(())
    }
}
