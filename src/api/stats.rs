//! Statistics endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    services::stats::{LibraryStats, MemberSummary},
};

/// Library-wide circulation figures
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Circulation statistics", body = LibraryStats)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<LibraryStats>> {
    let stats = state.services.stats.library(Utc::now()).await?;
    Ok(Json(stats))
}

/// One member's loans, reservations and fines at a glance
#[utoipa::path(
    get,
    path = "/members/{id}/summary",
    tag = "stats",
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member summary", body = MemberSummary)
    )
)]
pub async fn get_member_summary(
    State(state): State<crate::AppState>,
    Path(member_id): Path<i32>,
) -> AppResult<Json<MemberSummary>> {
    let summary = state.services.stats.member(member_id, Utc::now()).await?;
    Ok(Json(summary))
}
