//! Fines repository for database operations

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::FineStatus,
        fine::{FineQuery, FineRecord, FineRecordRow},
    },
};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get fine by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<FineRecord> {
        sqlx::query_as::<_, FineRecordRow>("SELECT * FROM fines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(FineRecord::from)
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    /// List fines with filters and pagination
    pub async fn list(&self, query: &FineQuery) -> AppResult<(Vec<FineRecord>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let status_filter: Option<i16> = query.status.map(i16::from);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM fines
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::int IS NULL OR user_id = $2)
            "#,
        )
        .bind(status_filter)
        .bind(query.user_id)
        .fetch_one(&self.pool)
        .await?;

        let fines = sqlx::query_as::<_, FineRecordRow>(
            r#"
            SELECT * FROM fines
            WHERE ($1::smallint IS NULL OR status = $1)
              AND ($2::int IS NULL OR user_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status_filter)
        .bind(query.user_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(FineRecord::from)
        .collect();

        Ok((fines, total))
    }

    /// All fines for a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<FineRecord>> {
        let fines = sqlx::query_as::<_, FineRecordRow>(
            "SELECT * FROM fines WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(FineRecord::from)
        .collect();

        Ok(fines)
    }

    /// Open a PENDING fine inside a ledger transaction
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        issue_record_id: i32,
        amount: Decimal,
        reason: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO fines (user_id, issue_record_id, amount, reason, status, created_at)
            VALUES ($1, $2, $3, $4, 0, NOW())
            "#,
        )
        .bind(user_id)
        .bind(issue_record_id)
        .bind(amount)
        .bind(reason)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// PENDING → PAID
    pub async fn mark_paid(&self, id: i32) -> AppResult<FineRecord> {
        self.settle(id, FineStatus::Paid).await
    }

    /// PENDING → WAIVED
    pub async fn waive(&self, id: i32) -> AppResult<FineRecord> {
        self.settle(id, FineStatus::Waived).await
    }

    async fn settle(&self, id: i32, target: FineStatus) -> AppResult<FineRecord> {
        let paid_at = if target == FineStatus::Paid { "NOW()" } else { "NULL" };
        let row = sqlx::query_as::<_, FineRecordRow>(&format!(
            r#"
            UPDATE fines SET status = $2, paid_at = {paid_at}
            WHERE id = $1 AND status = 0
            RETURNING *
            "#
        ))
        .bind(id)
        .bind(i16::from(target))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(FineRecord::from(row)),
            None => {
                // Either unknown or already settled; report which
                let existing = self.get_by_id(id).await?;
                Err(AppError::InvalidTransition(format!(
                    "Fine {} is {}, only PENDING fines can be settled",
                    id, existing.status
                )))
            }
        }
    }
}
