//! Fine record model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::FineStatus;

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct FineRecordRow {
    id: i32,
    user_id: i32,
    issue_record_id: i32,
    amount: Decimal,
    reason: String,
    status: i16,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<FineRecordRow> for FineRecord {
    fn from(row: FineRecordRow) -> Self {
        FineRecord {
            id: row.id,
            user_id: row.user_id,
            issue_record_id: row.issue_record_id,
            amount: row.amount,
            reason: row.reason,
            status: FineStatus::from(row.status),
            paid_at: row.paid_at,
            created_at: row.created_at,
        }
    }
}

/// A finalized monetary penalty, opened when an overdue issue reaches a
/// terminal state. PAID/WAIVED bookkeeping is independent of the accrual.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FineRecord {
    pub id: i32,
    pub user_id: i32,
    pub issue_record_id: i32,
    pub amount: Decimal,
    pub reason: String,
    pub status: FineStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fine list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct FineQuery {
    pub status: Option<FineStatus>,
    pub user_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
