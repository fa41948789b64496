//! Fine management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::fine::{FineQuery, FineRecord},
};

use super::AuthenticatedUser;

/// Paginated fine list
#[derive(Serialize, ToSchema)]
pub struct FineListResponse {
    pub items: Vec<FineRecord>,
    pub total: i64,
}

/// List fines (staff view)
#[utoipa::path(
    get,
    path = "/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(FineQuery),
    responses(
        (status = 200, description = "Fines", body = FineListResponse)
    )
)]
pub async fn list_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<FineQuery>,
) -> AppResult<Json<FineListResponse>> {
    claims.require_librarian()?;

    let (items, total) = state.services.fines.list_fines(&query).await?;
    Ok(Json(FineListResponse { items, total }))
}

/// List the authenticated user's fines
#[utoipa::path(
    get,
    path = "/fines/my",
    tag = "fines",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own fines", body = Vec<FineRecord>)
    )
)]
pub async fn my_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<FineRecord>>> {
    let fines = state.services.fines.list_user_fines(claims.user_id).await?;
    Ok(Json(fines))
}

/// Settle a fine as paid
#[utoipa::path(
    post,
    path = "/fines/{id}/pay",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Fine ID")),
    responses(
        (status = 200, description = "Fine paid", body = FineRecord),
        (status = 404, description = "Fine not found"),
        (status = 409, description = "Fine already settled")
    )
)]
pub async fn pay_fine(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<FineRecord>> {
    claims.require_librarian()?;

    let fine = state.services.fines.pay(id).await?;
    Ok(Json(fine))
}

/// Waive a fine
#[utoipa::path(
    post,
    path = "/fines/{id}/waive",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Fine ID")),
    responses(
        (status = 200, description = "Fine waived", body = FineRecord),
        (status = 404, description = "Fine not found"),
        (status = 409, description = "Fine already settled")
    )
)]
pub async fn waive_fine(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<FineRecord>> {
    claims.require_librarian()?;

    let fine = state.services.fines.waive(id).await?;
    Ok(Json(fine))
}
