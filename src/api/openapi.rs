//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, fines, health, issues, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblios API",
        version = "1.0.0",
        description = "Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Biblios Team", email = "contact@biblios.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::refresh,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::get_availability,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Issues
        issues::request_issue,
        issues::list_issues,
        issues::my_issues,
        issues::user_issues,
        issues::get_issue,
        issues::approve_issue,
        issues::reject_issue,
        issues::return_book,
        issues::renew_issue,
        issues::mark_lost,
        // Fines
        fines::list_fines,
        fines::my_fines,
        fines::pay_fine,
        fines::waive_fine,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            crate::models::user::RegisterRequest,
            crate::models::user::RefreshRequest,
            crate::models::user::TokenResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookAvailability,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::BookListResponse,
            // Issues
            crate::models::enums::IssueStatus,
            crate::models::issue::IssueRecord,
            crate::models::issue::IssueDetails,
            crate::models::issue::CreateIssueRequest,
            issues::IssueListResponse,
            issues::ApproveIssueRequest,
            issues::RejectIssueRequest,
            issues::ReturnBookRequest,
            // Fines
            crate::models::enums::FineStatus,
            crate::models::fine::FineRecord,
            fines::FineListResponse,
            // Users
            crate::models::enums::Role,
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            users::UserListResponse,
            // Stats
            stats::DashboardStats,
            stats::BookStats,
            stats::UserStats,
            stats::IssueStats,
            stats::FineStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "issues", description = "Issue ledger"),
        (name = "fines", description = "Fine management"),
        (name = "users", description = "User management"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
