//! Dashboard statistics endpoint

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Book counters
#[derive(Serialize, ToSchema)]
pub struct BookStats {
    pub total: i64,
    pub active: i64,
    pub total_copies: i64,
    pub available_copies: i64,
}

/// User counters
#[derive(Serialize, ToSchema)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
}

/// Issue ledger counters. `overdue` is a subset of `active`.
#[derive(Serialize, ToSchema)]
pub struct IssueStats {
    pub pending: i64,
    pub active: i64,
    pub overdue: i64,
}

/// Fine counters
#[derive(Serialize, ToSchema)]
pub struct FineStats {
    pub pending: i64,
    pub pending_amount: Decimal,
}

/// Dashboard statistics response
#[derive(Serialize, ToSchema)]
pub struct DashboardStats {
    pub books: BookStats,
    pub users: UserStats,
    pub issues: IssueStats,
    pub fines: FineStats,
}

/// Dashboard counters (staff view)
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    claims.require_librarian()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
