//! Issue ledger repository for database operations
//!
//! Every transition runs in a transaction that locks the issue row, applies
//! the pure guards from [`crate::models::issue`], performs the catalog side
//! effect, and writes the new state back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::IssueStatus,
        issue::{IssueDetails, IssueQuery, IssueRecord, IssueRecordRow},
    },
    repository::{books::BooksRepository, fines::FinesRepository},
};

/// Effective status as a SQL expression: ISSUED past its due date reads as
/// OVERDUE. Must stay in sync with `IssueRecord::effective_status`.
const EFFECTIVE_STATUS_SQL: &str =
    "CASE WHEN i.status = 1 AND i.due_date < NOW() THEN 2 ELSE i.status END";

#[derive(Clone)]
pub struct IssuesRepository {
    pool: Pool<Postgres>,
}

fn record_from_row(row: &PgRow) -> IssueRecord {
    IssueRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        book_id: row.get("book_id"),
        request_date: row.get("request_date"),
        issue_date: row.get("issue_date"),
        due_date: row.get("due_date"),
        return_date: row.get("return_date"),
        status: IssueStatus::from(row.get::<i16, _>("status")),
        renewal_count: row.get("renewal_count"),
        fine: row.get("fine"),
        reject_reason: row.get("reject_reason"),
    }
}

impl IssuesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get issue record by ID (stored state, no reclassification)
    pub async fn get_by_id(&self, id: i32) -> AppResult<IssueRecord> {
        sqlx::query_as::<_, IssueRecordRow>("SELECT * FROM issue_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(IssueRecord::from)
            .ok_or_else(|| AppError::NotFound(format!("Issue record with id {} not found", id)))
    }

    /// Get issue record with book title, status and fine as of now
    pub async fn get_details(&self, id: i32, rate_per_day: Decimal) -> AppResult<IssueDetails> {
        let row = sqlx::query(
            r#"
            SELECT i.*, b.title AS book_title
            FROM issue_records i
            JOIN books b ON i.book_id = b.id
            WHERE i.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue record with id {} not found", id)))?;

        let record = record_from_row(&row);
        let title: String = row.get("book_title");
        Ok(IssueDetails::from_record(record, Some(title), Utc::now(), rate_per_day))
    }

    /// List issue records, filterable by effective status / user / book
    pub async fn list(
        &self,
        query: &IssueQuery,
        rate_per_day: Decimal,
    ) -> AppResult<(Vec<IssueDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let status_filter: Option<i16> = query.status.map(i16::from);

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*) FROM issue_records i
            WHERE ($1::smallint IS NULL OR {EFFECTIVE_STATUS_SQL} = $1)
              AND ($2::int IS NULL OR i.user_id = $2)
              AND ($3::int IS NULL OR i.book_id = $3)
            "#
        ))
        .bind(status_filter)
        .bind(query.user_id)
        .bind(query.book_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT i.*, b.title AS book_title
            FROM issue_records i
            JOIN books b ON i.book_id = b.id
            WHERE ($1::smallint IS NULL OR {EFFECTIVE_STATUS_SQL} = $1)
              AND ($2::int IS NULL OR i.user_id = $2)
              AND ($3::int IS NULL OR i.book_id = $3)
            ORDER BY i.request_date DESC, i.id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(status_filter)
        .bind(query.user_id)
        .bind(query.book_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        let details = rows
            .iter()
            .map(|row| {
                let record = record_from_row(row);
                let title: String = row.get("book_title");
                IssueDetails::from_record(record, Some(title), now, rate_per_day)
            })
            .collect();

        Ok((details, total))
    }

    /// All issue records for a user, newest first
    pub async fn list_for_user(
        &self,
        user_id: i32,
        rate_per_day: Decimal,
    ) -> AppResult<Vec<IssueDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT i.*, b.title AS book_title
            FROM issue_records i
            JOIN books b ON i.book_id = b.id
            WHERE i.user_id = $1
            ORDER BY i.request_date DESC, i.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        Ok(rows
            .iter()
            .map(|row| {
                let record = record_from_row(row);
                let title: String = row.get("book_title");
                IssueDetails::from_record(record, Some(title), now, rate_per_day)
            })
            .collect())
    }

    /// Create a PENDING issue request after the policy checks.
    /// The copy is reserved at approval time, not here; these checks are
    /// advisory and re-verified under the approval transaction.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        max_active_issues: i64,
    ) -> AppResult<IssueRecord> {
        let user_active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match user_active {
            None => return Err(AppError::NotFound(format!("User with id {} not found", user_id))),
            Some(false) => {
                return Err(AppError::PolicyViolation(format!("User {} is not active", user_id)))
            }
            Some(true) => {}
        }

        let book: Option<(bool, i32)> =
            sqlx::query_as("SELECT is_active, available_copies FROM books WHERE id = $1")
                .bind(book_id)
                .fetch_optional(&self.pool)
                .await?;
        match book {
            None => return Err(AppError::NotFound(format!("Book with id {} not found", book_id))),
            Some((false, _)) => {
                return Err(AppError::PolicyViolation(format!("Book {} is not active", book_id)))
            }
            Some((true, available)) if available <= 0 => {
                return Err(AppError::OutOfStock(format!(
                    "No available copies of book {}",
                    book_id
                )))
            }
            Some((true, _)) => {}
        }

        let unresolved_fines: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM fines WHERE user_id = $1 AND status = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if unresolved_fines > 0 {
            return Err(AppError::PolicyViolation(format!(
                "User {} has {} unresolved fine(s)",
                user_id, unresolved_fines
            )));
        }

        let active_issues: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM issue_records WHERE user_id = $1 AND status IN (1, 2)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if active_issues >= max_active_issues {
            return Err(AppError::PolicyViolation(format!(
                "User {} already has {} active issue(s) (limit {})",
                user_id, active_issues, max_active_issues
            )));
        }

        let row = sqlx::query_as::<_, IssueRecordRow>(
            r#"
            INSERT INTO issue_records (user_id, book_id, request_date, status, renewal_count, fine)
            VALUES ($1, $2, NOW(), 0, 0, 0)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(IssueRecord::from(row))
    }

    /// PENDING → ISSUED: reserve a copy and stamp the dates, atomically.
    pub async fn approve(&self, id: i32, loan_period_days: i64) -> AppResult<IssueRecord> {
        let mut tx = self.pool.begin().await?;
        let mut record = Self::lock_record(&mut tx, id).await?;

        record.approve(Utc::now(), loan_period_days)?;
        BooksRepository::reserve_copy(&mut tx, record.book_id).await?;

        sqlx::query(
            "UPDATE issue_records SET status = $2, issue_date = $3, due_date = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(i16::from(record.status))
        .bind(record.issue_date)
        .bind(record.due_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// PENDING → REJECTED
    pub async fn reject(&self, id: i32, reason: Option<String>) -> AppResult<IssueRecord> {
        let mut tx = self.pool.begin().await?;
        let mut record = Self::lock_record(&mut tx, id).await?;

        record.reject(reason)?;

        sqlx::query("UPDATE issue_records SET status = $2, reject_reason = $3 WHERE id = $1")
            .bind(id)
            .bind(i16::from(record.status))
            .bind(&record.reject_reason)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// ISSUED/OVERDUE → RETURNED: release the copy, freeze the fine, and
    /// open a fine record when the return was late.
    pub async fn return_book(
        &self,
        id: i32,
        return_date: Option<DateTime<Utc>>,
        rate_per_day: Decimal,
    ) -> AppResult<IssueRecord> {
        let return_date = return_date.unwrap_or_else(Utc::now);

        let mut tx = self.pool.begin().await?;
        let mut record = Self::lock_record(&mut tx, id).await?;

        let frozen = record.finalize_return(return_date, rate_per_day)?;
        BooksRepository::release_copy(&mut tx, record.book_id).await?;

        sqlx::query(
            "UPDATE issue_records SET status = $2, return_date = $3, fine = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(i16::from(record.status))
        .bind(record.return_date)
        .bind(record.fine)
        .execute(&mut *tx)
        .await?;

        if frozen > Decimal::ZERO {
            FinesRepository::create_in_tx(
                &mut tx,
                record.user_id,
                record.id,
                frozen,
                "Book returned after due date",
            )
            .await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    /// ISSUED self-transition: extend the due date within policy limits.
    pub async fn renew(
        &self,
        id: i32,
        max_renewals: i16,
        extension_days: i64,
        rate_per_day: Decimal,
    ) -> AppResult<IssueRecord> {
        let mut tx = self.pool.begin().await?;
        let mut record = Self::lock_record(&mut tx, id).await?;

        record.renew(Utc::now(), max_renewals, extension_days, rate_per_day)?;

        sqlx::query("UPDATE issue_records SET due_date = $2, renewal_count = $3 WHERE id = $1")
            .bind(id)
            .bind(record.due_date)
            .bind(record.renewal_count)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// ISSUED/OVERDUE → LOST. No copy release: the copy left circulation.
    /// The catalog's total is corrected by a separate inventory adjustment.
    pub async fn mark_lost(&self, id: i32, rate_per_day: Decimal) -> AppResult<IssueRecord> {
        let mut tx = self.pool.begin().await?;
        let mut record = Self::lock_record(&mut tx, id).await?;

        let frozen = record.mark_lost(Utc::now(), rate_per_day)?;

        sqlx::query("UPDATE issue_records SET status = $2, fine = $3 WHERE id = $1")
            .bind(id)
            .bind(i16::from(record.status))
            .bind(record.fine)
            .execute(&mut *tx)
            .await?;

        if frozen > Decimal::ZERO {
            FinesRepository::create_in_tx(
                &mut tx,
                record.user_id,
                record.id,
                frozen,
                "Book marked lost while overdue",
            )
            .await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn lock_record(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<IssueRecord> {
        sqlx::query_as::<_, IssueRecordRow>("SELECT * FROM issue_records WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .map(IssueRecord::from)
            .ok_or_else(|| AppError::NotFound(format!("Issue record with id {} not found", id)))
    }
}
