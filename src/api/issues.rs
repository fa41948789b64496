//! Issue ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::issue::{CreateIssueRequest, IssueDetails, IssueQuery, IssueRecord},
};

use super::AuthenticatedUser;

/// Paginated issue list
#[derive(Serialize, ToSchema)]
pub struct IssueListResponse {
    pub items: Vec<IssueDetails>,
    pub total: i64,
}

/// Approve request body
#[derive(Deserialize, ToSchema)]
pub struct ApproveIssueRequest {
    /// Loan period override; defaults to the configured policy
    pub loan_period_days: Option<i64>,
}

/// Reject request body
#[derive(Deserialize, ToSchema)]
pub struct RejectIssueRequest {
    pub reason: Option<String>,
}

/// Return request body
#[derive(Deserialize, ToSchema)]
pub struct ReturnBookRequest {
    /// Effective return date; defaults to now
    pub return_date: Option<DateTime<Utc>>,
}

/// Request an issue (creates a PENDING record)
#[utoipa::path(
    post,
    path = "/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    request_body = CreateIssueRequest,
    responses(
        (status = 201, description = "Issue requested", body = IssueRecord),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "No available copies"),
        (status = 422, description = "Policy violation")
    )
)]
pub async fn request_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateIssueRequest>,
) -> AppResult<(StatusCode, Json<IssueRecord>)> {
    // Librarians may request on behalf of a reader
    let user_id = request.user_id.unwrap_or(claims.user_id);
    claims.require_self_or_librarian(user_id)?;

    let record = state.services.issues.request_issue(user_id, request.book_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List issue records (staff view, filterable by effective status)
#[utoipa::path(
    get,
    path = "/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(IssueQuery),
    responses(
        (status = 200, description = "Issue records", body = IssueListResponse)
    )
)]
pub async fn list_issues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<IssueQuery>,
) -> AppResult<Json<IssueListResponse>> {
    claims.require_librarian()?;

    let (items, total) = state.services.issues.list_issues(&query).await?;
    Ok(Json(IssueListResponse { items, total }))
}

/// List the authenticated user's issue records
#[utoipa::path(
    get,
    path = "/issues/my",
    tag = "issues",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own issue records", body = Vec<IssueDetails>)
    )
)]
pub async fn my_issues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<IssueDetails>>> {
    let issues = state.services.issues.list_user_issues(claims.user_id).await?;
    Ok(Json(issues))
}

/// List a user's issue records (staff view)
#[utoipa::path(
    get,
    path = "/issues/user/{user_id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User's issue records", body = Vec<IssueDetails>)
    )
)]
pub async fn user_issues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<IssueDetails>>> {
    claims.require_self_or_librarian(user_id)?;

    let issues = state.services.issues.list_user_issues(user_id).await?;
    Ok(Json(issues))
}

/// Get one issue record, with status and fine as of now
#[utoipa::path(
    get,
    path = "/issues/{id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Issue record ID")),
    responses(
        (status = 200, description = "Issue record", body = IssueDetails),
        (status = 404, description = "Record not found")
    )
)]
pub async fn get_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<IssueDetails>> {
    let details = state.services.issues.get_issue(id).await?;
    claims.require_self_or_librarian(details.user_id)?;
    Ok(Json(details))
}

/// Approve a pending issue request
#[utoipa::path(
    post,
    path = "/issues/{id}/approve",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Issue record ID")),
    request_body = ApproveIssueRequest,
    responses(
        (status = 200, description = "Issue approved", body = IssueRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Not pending, or no available copies")
    )
)]
pub async fn approve_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Option<Json<ApproveIssueRequest>>,
) -> AppResult<Json<IssueRecord>> {
    claims.require_librarian()?;

    let loan_period_days = body.and_then(|Json(b)| b.loan_period_days);
    let record = state.services.issues.approve_issue(id, loan_period_days).await?;
    Ok(Json(record))
}

/// Reject a pending issue request
#[utoipa::path(
    post,
    path = "/issues/{id}/reject",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Issue record ID")),
    request_body = RejectIssueRequest,
    responses(
        (status = 200, description = "Issue rejected", body = IssueRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Record is not pending")
    )
)]
pub async fn reject_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Option<Json<RejectIssueRequest>>,
) -> AppResult<Json<IssueRecord>> {
    claims.require_librarian()?;

    let reason = body.and_then(|Json(b)| b.reason);
    let record = state.services.issues.reject_issue(id, reason).await?;
    Ok(Json(record))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/issues/{id}/return",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Issue record ID")),
    request_body = ReturnBookRequest,
    responses(
        (status = 200, description = "Book returned", body = IssueRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Record is not out")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Option<Json<ReturnBookRequest>>,
) -> AppResult<Json<IssueRecord>> {
    claims.require_librarian()?;

    let return_date = body.and_then(|Json(b)| b.return_date);
    let record = state.services.issues.return_book(id, return_date).await?;
    Ok(Json(record))
}

/// Renew an issued book
#[utoipa::path(
    post,
    path = "/issues/{id}/renew",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Issue record ID")),
    responses(
        (status = 200, description = "Issue renewed", body = IssueRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Record is not issued"),
        (status = 422, description = "Renewal limit reached, fine outstanding, or overdue")
    )
)]
pub async fn renew_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<IssueRecord>> {
    // Renewal is available to the borrower as well as staff
    let record = state.services.issues.get_issue(id).await?;
    claims.require_self_or_librarian(record.user_id)?;

    let record = state.services.issues.renew(id).await?;
    Ok(Json(record))
}

/// Mark an issued book as lost
#[utoipa::path(
    post,
    path = "/issues/{id}/lost",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Issue record ID")),
    responses(
        (status = 200, description = "Book marked lost", body = IssueRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Record is not out")
    )
)]
pub async fn mark_lost(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<IssueRecord>> {
    claims.require_librarian()?;

    let record = state.services.issues.mark_lost(id).await?;
    Ok(Json(record))
}
