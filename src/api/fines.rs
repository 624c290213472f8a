//! Fine endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::fine::{CreateFine, Fine, FineQuery, PayFine, WaiveFine},
};

/// List fines
#[utoipa::path(
    get,
    path = "/fines",
    tag = "fines",
    params(FineQuery),
    responses(
        (status = 200, description = "Fines matching the query", body = Vec<Fine>)
    )
)]
pub async fn list_fines(
    State(state): State<crate::AppState>,
    Query(query): Query<FineQuery>,
) -> AppResult<Json<Vec<Fine>>> {
    let fines = state.services.fines.list(&query).await?;
    Ok(Json(fines))
}

/// Get fine by ID
#[utoipa::path(
    get,
    path = "/fines/{id}",
    tag = "fines",
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    responses(
        (status = 200, description = "Fine details", body = Fine),
        (status = 404, description = "Fine not found")
    )
)]
pub async fn get_fine(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Fine>> {
    let fine = state.services.fines.get_by_id(id).await?;
    Ok(Json(fine))
}

/// Record a fine by hand
#[utoipa::path(
    post,
    path = "/fines",
    tag = "fines",
    request_body = CreateFine,
    responses(
        (status = 201, description = "Fine created", body = Fine),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already has a pending fine", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_fine(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateFine>,
) -> AppResult<(StatusCode, Json<Fine>)> {
    let fine = state.services.fines.create(&request).await?;
    Ok((StatusCode::CREATED, Json(fine)))
}

/// Mark a fine as paid
#[utoipa::path(
    post,
    path = "/fines/{id}/pay",
    tag = "fines",
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    request_body = PayFine,
    responses(
        (status = 200, description = "Fine paid", body = Fine),
        (status = 404, description = "Fine not found"),
        (status = 409, description = "Fine is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn pay_fine(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    body: Option<Json<PayFine>>,
) -> AppResult<Json<Fine>> {
    let payment_date = body.and_then(|Json(p)| p.payment_date);
    let fine = state.services.fines.pay(id, payment_date).await?;
    Ok(Json(fine))
}

/// Waive a fine
#[utoipa::path(
    post,
    path = "/fines/{id}/waive",
    tag = "fines",
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    request_body = WaiveFine,
    responses(
        (status = 200, description = "Fine waived", body = Fine),
        (status = 404, description = "Fine not found"),
        (status = 409, description = "Fine is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn waive_fine(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    body: Option<Json<WaiveFine>>,
) -> AppResult<Json<Fine>> {
    let notes = body.and_then(|Json(w)| w.notes);
    let fine = state.services.fines.waive(id, notes).await?;
    Ok(Json(fine))
}
