//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::loan::{IssueLoan, Loan, LoanQuery, ReturnLoan, ReturnOutcome, UpdateLoan},
};

/// List loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans matching the query", body = Vec<Loan>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list(&query).await?;
    Ok(Json(loans))
}

/// Get loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_by_id(id).await?;
    Ok(Json(loan))
}

/// Issue a loan (borrow a book)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = IssueLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No copy available", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<IssueLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.issue(&request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Edit a loan
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Status change not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(edit): Json<UpdateLoan>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.update(id, &edit).await?;
    Ok(Json(loan))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan returned, with any late fine", body = ReturnOutcome),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    body: Option<Json<ReturnLoan>>,
) -> AppResult<Json<ReturnOutcome>> {
    let return_date = body.and_then(|Json(r)| r.return_date);
    let outcome = state.services.loans.record_return(id, return_date).await?;
    Ok(Json(outcome))
}

/// Flag active loans past their due date as overdue
#[utoipa::path(
    post,
    path = "/loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Loans flagged by this sweep", body = Vec<Loan>)
    )
)]
pub async fn mark_overdue(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Loan>>> {
    let flagged = state.services.loans.mark_overdue(Utc::now()).await?;
    Ok(Json(flagged))
}
