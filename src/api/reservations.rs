//! Reservation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::reservation::{
        ConvertReservation, CreateReservation, CreateReservationBatch, Reservation, ReservationLoan,
        ReservationQuery,
    },
};

/// List reservations
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    params(ReservationQuery),
    responses(
        (status = 200, description = "Reservations matching the query", body = Vec<Reservation>)
    )
)]
pub async fn list_reservations(
    State(state): State<crate::AppState>,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state.services.reservations.list(&query).await?;
    Ok(Json(reservations))
}

/// Get reservation by ID
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation details", body = Reservation),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.services.reservations.get_by_id(id).await?;
    Ok(Json(reservation))
}

/// Reserve a book
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state.services.reservations.create(&request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Reserve several books at once under one group code
#[utoipa::path(
    post,
    path = "/reservations/batch",
    tag = "reservations",
    request_body = CreateReservationBatch,
    responses(
        (status = 201, description = "Reservations created", body = Vec<Reservation>),
        (status = 400, description = "Empty batch"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_reservation_batch(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateReservationBatch>,
) -> AppResult<(StatusCode, Json<Vec<Reservation>>)> {
    let reservations = state.services.reservations.create_batch(&request).await?;
    Ok((StatusCode::CREATED, Json(reservations)))
}

/// Confirm a pending reservation, holding a copy
#[utoipa::path(
    post,
    path = "/reservations/{id}/confirm",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation confirmed", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "No copy available or not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn confirm_reservation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.services.reservations.confirm(id).await?;
    Ok(Json(reservation))
}

/// Cancel a reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation already closed", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.services.reservations.cancel(id).await?;
    Ok(Json(reservation))
}

/// Delete a reservation
#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 204, description = "Reservation deleted"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn delete_reservation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.reservations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Hand a confirmed reservation over as a loan
#[utoipa::path(
    post,
    path = "/reservations/{id}/loan",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    request_body = ConvertReservation,
    responses(
        (status = 201, description = "Loan created from reservation", body = ReservationLoan),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation not confirmed", body = crate::error::ErrorResponse)
    )
)]
pub async fn convert_reservation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ConvertReservation>,
) -> AppResult<(StatusCode, Json<ReservationLoan>)> {
    let converted = state.services.reservations.convert_to_loan(id, &request).await?;
    Ok((StatusCode::CREATED, Json(converted)))
}

/// Expire open reservations past their expiration date
#[utoipa::path(
    post,
    path = "/reservations/expire",
    tag = "reservations",
    responses(
        (status = 200, description = "Reservations expired by this sweep", body = Vec<Reservation>)
    )
)]
pub async fn expire_reservations(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Reservation>>> {
    let expired = state.services.reservations.expire(Utc::now()).await?;
    Ok(Json(expired))
}
