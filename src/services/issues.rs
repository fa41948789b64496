//! Issue ledger service

use chrono::{DateTime, Utc};

use crate::{
    config::PolicyConfig,
    error::AppResult,
    models::issue::{IssueDetails, IssueQuery, IssueRecord},
    repository::Repository,
};

#[derive(Clone)]
pub struct IssuesService {
    repository: Repository,
    policy: PolicyConfig,
}

impl IssuesService {
    pub fn new(repository: Repository, policy: PolicyConfig) -> Self {
        Self { repository, policy }
    }

    /// Get an issue record with status/fine computed as of now
    pub async fn get_issue(&self, id: i32) -> AppResult<IssueDetails> {
        self.repository
            .issues
            .get_details(id, self.policy.fine_rate_per_day)
            .await
    }

    /// List issue records (admin views)
    pub async fn list_issues(&self, query: &IssueQuery) -> AppResult<(Vec<IssueDetails>, i64)> {
        self.repository
            .issues
            .list(query, self.policy.fine_rate_per_day)
            .await
    }

    /// List issue records for one user
    pub async fn list_user_issues(&self, user_id: i32) -> AppResult<Vec<IssueDetails>> {
        self.repository
            .issues
            .list_for_user(user_id, self.policy.fine_rate_per_day)
            .await
    }

    /// Request an issue: creates a PENDING record, subject to policy checks
    pub async fn request_issue(&self, user_id: i32, book_id: i32) -> AppResult<IssueRecord> {
        let record = self
            .repository
            .issues
            .create(user_id, book_id, self.policy.max_active_issues)
            .await?;
        tracing::info!(record_id = record.id, user_id, book_id, "issue requested");
        Ok(record)
    }

    /// Approve a pending request, reserving a copy
    pub async fn approve_issue(
        &self,
        id: i32,
        loan_period_days: Option<i64>,
    ) -> AppResult<IssueRecord> {
        let period = loan_period_days.unwrap_or(self.policy.loan_period_days);
        let record = self.repository.issues.approve(id, period).await?;
        tracing::info!(record_id = id, due = ?record.due_date, "issue approved");
        Ok(record)
    }

    /// Reject a pending request
    pub async fn reject_issue(&self, id: i32, reason: Option<String>) -> AppResult<IssueRecord> {
        self.repository.issues.reject(id, reason).await
    }

    /// Return a book, releasing the copy and freezing any accrued fine
    pub async fn return_book(
        &self,
        id: i32,
        return_date: Option<DateTime<Utc>>,
    ) -> AppResult<IssueRecord> {
        let record = self
            .repository
            .issues
            .return_book(id, return_date, self.policy.fine_rate_per_day)
            .await?;
        tracing::info!(record_id = id, fine = %record.fine, "book returned");
        Ok(record)
    }

    /// Renew an issued book within policy limits
    pub async fn renew(&self, id: i32) -> AppResult<IssueRecord> {
        self.repository
            .issues
            .renew(
                id,
                self.policy.max_renewals,
                self.policy.renewal_extension_days,
                self.policy.fine_rate_per_day,
            )
            .await
    }

    /// Mark an issued/overdue book as lost
    pub async fn mark_lost(&self, id: i32) -> AppResult<IssueRecord> {
        let record = self
            .repository
            .issues
            .mark_lost(id, self.policy.fine_rate_per_day)
            .await?;
        tracing::warn!(record_id = id, book_id = record.book_id, "book marked lost");
        Ok(record)
    }
}
