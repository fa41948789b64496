//! Statistics service

use rust_decimal::Decimal;

use crate::{
    api::stats::{BookStats, DashboardStats, FineStats, IssueStats, UserStats},
    error::AppResult,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Dashboard counters for the admin landing view
    pub async fn get_stats(&self) -> AppResult<DashboardStats> {
        let pool = &self.repository.pool;

        let total_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(pool)
            .await?;
        let active_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_active")
            .fetch_one(pool)
            .await?;
        let total_copies: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_copies), 0) FROM books WHERE is_active")
                .fetch_one(pool)
                .await?;
        let available_copies: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(available_copies), 0) FROM books WHERE is_active",
        )
        .fetch_one(pool)
        .await?;

        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        let active_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active")
            .fetch_one(pool)
            .await?;

        let pending_issues: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM issue_records WHERE status = 0")
                .fetch_one(pool)
                .await?;
        let active_issues: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM issue_records WHERE status IN (1, 2)")
                .fetch_one(pool)
                .await?;
        // Overdue is computed, not stored
        let overdue_issues: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM issue_records WHERE status = 1 AND due_date < NOW()",
        )
        .fetch_one(pool)
        .await?;

        let pending_fines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fines WHERE status = 0")
            .fetch_one(pool)
            .await?;
        let pending_fine_amount: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM fines WHERE status = 0")
                .fetch_one(pool)
                .await?;

        Ok(DashboardStats {
            books: BookStats {
                total: total_books,
                active: active_books,
                total_copies,
                available_copies,
            },
            users: UserStats {
                total: total_users,
                active: active_users,
            },
            issues: IssueStats {
                pending: pending_issues,
                active: active_issues,
                overdue: overdue_issues,
            },
            fines: FineStats {
                pending: pending_fines,
                pending_amount: pending_fine_amount,
            },
        })
    }
}
