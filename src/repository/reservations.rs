//! Reservations repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::ReservationStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::ReservationStatus,
        reservation::{NewReservation, Reservation, ReservationQuery},
    },
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for ReservationsRepository {
    async fn list(&self, query: &ReservationQuery) -> AppResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE ($1::int IS NULL OR member_id = $1)
              AND ($2::int IS NULL OR book_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::text IS NULL OR group_code = $4)
            ORDER BY reservation_date, id
            "#,
        )
        .bind(query.member_id)
        .bind(query.book_id)
        .bind(query.status.map(|s| s.as_str()))
        .bind(&query.group_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    async fn get(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    async fn create(&self, reservation: &NewReservation) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                book_id, member_id, reservation_date, expiration_date,
                status, notified, group_code
            ) VALUES ($1, $2, $3, $4, 'pending', FALSE, $5)
            RETURNING *
            "#,
        )
        .bind(reservation.book_id)
        .bind(reservation.member_id)
        .bind(reservation.reservation_date)
        .bind(reservation.expiration_date)
        .bind(&reservation.group_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(reservation)
    }

    async fn update(&self, reservation: &Reservation, expected: ReservationStatus) -> AppResult<Reservation> {
        let updated = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations SET
                expiration_date = $3, status = $4, notified = $5
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(reservation.id)
        .bind(expected.as_str())
        .bind(reservation.expiration_date)
        .bind(reservation.status.as_str())
        .bind(reservation.notified)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(reservation) => Ok(reservation),
            None => {
                // Missing row stays NotFound, a moved one is a lost race
                let current = self.get(reservation.id).await?;
                Err(AppError::StaleVersion(format!(
                    "reservation {} is {}, update expected {}",
                    current.id, current.status, expected
                )))
            }
        }
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reservation with id {} not found", id)));
        }
        Ok(())
    }
}
