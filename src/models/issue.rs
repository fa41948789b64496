//! Issue record model and lifecycle rules
//!
//! The transition guards and fine arithmetic live here as pure functions so
//! the ledger rules are testable without a database. The repository layer
//! re-states the same guards in SQL (`WHERE status = …`, compare-and-
//! decrement on the book row) so concurrent callers serialize on the
//! database rather than on application state.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::IssueStatus;
use crate::error::{AppError, AppResult};

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct IssueRecordRow {
    id: i32,
    user_id: i32,
    book_id: i32,
    request_date: DateTime<Utc>,
    issue_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    return_date: Option<DateTime<Utc>>,
    status: i16,
    renewal_count: i16,
    fine: Decimal,
    reject_reason: Option<String>,
}

impl From<IssueRecordRow> for IssueRecord {
    fn from(row: IssueRecordRow) -> Self {
        IssueRecord {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            request_date: row.request_date,
            issue_date: row.issue_date,
            due_date: row.due_date,
            return_date: row.return_date,
            status: IssueStatus::from(row.status),
            renewal_count: row.renewal_count,
            fine: row.fine,
            reject_reason: row.reject_reason,
        }
    }
}

/// One loan of one physical copy, preserved as a historical ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueRecord {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub request_date: DateTime<Utc>,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    /// Stored status. OVERDUE is never stored; use [`IssueRecord::effective_status`].
    pub status: IssueStatus,
    pub renewal_count: i16,
    /// Accrued fine. Derived while the record is out, frozen once terminal.
    pub fine: Decimal,
    pub reject_reason: Option<String>,
}

/// Full started days between `due` and `as_of`, rounded up. 0 when not late.
fn days_late(due: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    let secs = (as_of - due).num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + 86_399) / 86_400
    }
}

impl IssueRecord {
    /// Status as of `now`, reclassifying ISSUED past its due date as OVERDUE.
    /// Every status read goes through here (or the matching SQL expression)
    /// so no scheduler is needed.
    pub fn effective_status(&self, now: DateTime<Utc>) -> IssueStatus {
        match (self.status, self.due_date) {
            (IssueStatus::Issued, Some(due)) if now > due => IssueStatus::Overdue,
            (status, _) => status,
        }
    }

    /// Fine as of `now`. Terminal records report the frozen amount; active
    /// records accrue `rate_per_day` per started day past the due date.
    pub fn fine_as_of(&self, now: DateTime<Utc>, rate_per_day: Decimal) -> Decimal {
        if self.status.is_terminal() {
            return self.fine;
        }
        match self.due_date {
            Some(due) => Decimal::from(days_late(due, now)) * rate_per_day,
            None => Decimal::ZERO,
        }
    }

    /// PENDING → ISSUED. The caller reserves the copy; this sets the dates.
    pub fn approve(&mut self, now: DateTime<Utc>, loan_period_days: i64) -> AppResult<()> {
        if self.status != IssueStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "issue record {} is {}, only PENDING records can be approved",
                self.id, self.status
            )));
        }
        self.status = IssueStatus::Issued;
        self.issue_date = Some(now);
        self.due_date = Some(now + Duration::days(loan_period_days));
        Ok(())
    }

    /// PENDING → REJECTED. No catalog side effect.
    pub fn reject(&mut self, reason: Option<String>) -> AppResult<()> {
        if self.status != IssueStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "issue record {} is {}, only PENDING records can be rejected",
                self.id, self.status
            )));
        }
        self.status = IssueStatus::Rejected;
        self.reject_reason = reason;
        Ok(())
    }

    /// ISSUED/OVERDUE → RETURNED. Freezes the fine at `return_date` and
    /// returns the frozen amount so the caller can open a fine record.
    pub fn finalize_return(
        &mut self,
        return_date: DateTime<Utc>,
        rate_per_day: Decimal,
    ) -> AppResult<Decimal> {
        if !self.effective_status(return_date).holds_copy() {
            return Err(AppError::InvalidTransition(format!(
                "issue record {} is {}, only ISSUED or OVERDUE records can be returned",
                self.id, self.status
            )));
        }
        let frozen = self.fine_as_of(return_date, rate_per_day);
        self.status = IssueStatus::Returned;
        self.return_date = Some(return_date);
        self.fine = frozen;
        Ok(frozen)
    }

    /// ISSUED self-transition: extends the due date, bumps the renewal count.
    pub fn renew(
        &mut self,
        now: DateTime<Utc>,
        max_renewals: i16,
        extension_days: i64,
        rate_per_day: Decimal,
    ) -> AppResult<()> {
        if self.status != IssueStatus::Issued {
            return Err(AppError::InvalidTransition(format!(
                "issue record {} is {}, only ISSUED records can be renewed",
                self.id, self.status
            )));
        }
        if self.effective_status(now) == IssueStatus::Overdue {
            return Err(AppError::AlreadyOverdue(format!(
                "issue record {} is past its due date",
                self.id
            )));
        }
        if self.fine_as_of(now, rate_per_day) > Decimal::ZERO {
            return Err(AppError::OutstandingFine(format!(
                "issue record {} has an unpaid fine",
                self.id
            )));
        }
        if self.renewal_count >= max_renewals {
            return Err(AppError::RenewalLimitExceeded(format!(
                "issue record {} already renewed {} of {} times",
                self.id, self.renewal_count, max_renewals
            )));
        }
        let due = self.due_date.ok_or_else(|| {
            AppError::InvariantViolation(format!("ISSUED record {} has no due date", self.id))
        })?;
        // Extend from the current due date, not from now: renewing early
        // must not shorten the loan.
        self.due_date = Some(due + Duration::days(extension_days));
        self.renewal_count += 1;
        Ok(())
    }

    /// ISSUED/OVERDUE → LOST. The copy left circulation, so the caller must
    /// NOT release it back to the catalog; the fine freezes here.
    pub fn mark_lost(&mut self, now: DateTime<Utc>, rate_per_day: Decimal) -> AppResult<Decimal> {
        if !self.effective_status(now).holds_copy() {
            return Err(AppError::InvalidTransition(format!(
                "issue record {} is {}, only ISSUED or OVERDUE records can be marked lost",
                self.id, self.status
            )));
        }
        let frozen = self.fine_as_of(now, rate_per_day);
        self.status = IssueStatus::Lost;
        self.fine = frozen;
        Ok(frozen)
    }
}

/// Issue record as reported to clients, with status and fine computed as of
/// the read time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueDetails {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub book_title: Option<String>,
    pub request_date: DateTime<Utc>,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: IssueStatus,
    pub renewal_count: i16,
    pub fine: Decimal,
    pub reject_reason: Option<String>,
}

impl IssueDetails {
    pub fn from_record(
        record: IssueRecord,
        book_title: Option<String>,
        now: DateTime<Utc>,
        rate_per_day: Decimal,
    ) -> Self {
        let status = record.effective_status(now);
        let fine = record.fine_as_of(now, rate_per_day);
        Self {
            id: record.id,
            user_id: record.user_id,
            book_id: record.book_id,
            book_title,
            request_date: record.request_date,
            issue_date: record.issue_date,
            due_date: record.due_date,
            return_date: record.return_date,
            status,
            renewal_count: record.renewal_count,
            fine,
            reject_reason: record.reject_reason,
        }
    }
}

/// Issue request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIssueRequest {
    pub book_id: i32,
    /// Target user; defaults to the authenticated user. Librarians may
    /// request on behalf of readers.
    pub user_id: Option<i32>,
}

/// Issue list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct IssueQuery {
    /// Filter by effective status
    pub status: Option<IssueStatus>,
    pub user_id: Option<i32>,
    pub book_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::days(n)
    }

    fn rate() -> Decimal {
        Decimal::new(50, 2) // 0.50/day
    }

    fn pending_record() -> IssueRecord {
        IssueRecord {
            id: 1,
            user_id: 7,
            book_id: 3,
            request_date: day(0),
            issue_date: None,
            due_date: None,
            return_date: None,
            status: IssueStatus::Pending,
            renewal_count: 0,
            fine: Decimal::ZERO,
            reject_reason: None,
        }
    }

    fn issued_record(due_day: i64) -> IssueRecord {
        let mut record = pending_record();
        record.approve(day(0), due_day).unwrap();
        record
    }

    #[test]
    fn approve_sets_issue_and_due_dates() {
        let mut record = pending_record();
        record.approve(day(0), 14).unwrap();
        assert_eq!(record.status, IssueStatus::Issued);
        assert_eq!(record.issue_date, Some(day(0)));
        assert_eq!(record.due_date, Some(day(14)));
    }

    #[test]
    fn approve_twice_is_invalid() {
        let mut record = issued_record(14);
        assert!(matches!(
            record.approve(day(1), 14),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn reject_only_from_pending() {
        let mut record = pending_record();
        record.reject(Some("no card on file".into())).unwrap();
        assert_eq!(record.status, IssueStatus::Rejected);

        let mut record = issued_record(14);
        assert!(matches!(record.reject(None), Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn issued_past_due_reads_as_overdue() {
        let record = issued_record(14);
        assert_eq!(record.effective_status(day(10)), IssueStatus::Issued);
        assert_eq!(record.effective_status(day(20)), IssueStatus::Overdue);
    }

    #[test]
    fn fine_is_zero_before_due_date() {
        let record = issued_record(14);
        assert_eq!(record.fine_as_of(day(14), rate()), Decimal::ZERO);
    }

    #[test]
    fn fine_at_day_20_for_14_day_loan_is_six_days() {
        let record = issued_record(14);
        assert_eq!(record.fine_as_of(day(20), rate()), Decimal::from(6) * rate());
    }

    #[test]
    fn partial_overdue_day_counts_as_a_full_day() {
        let record = issued_record(14);
        let just_late = day(14) + Duration::seconds(1);
        assert_eq!(record.fine_as_of(just_late, rate()), rate());
    }

    #[test]
    fn fine_is_monotone_while_out() {
        let record = issued_record(14);
        let mut previous = Decimal::ZERO;
        for n in 0..40 {
            let current = record.fine_as_of(day(n), rate());
            assert!(current >= previous, "fine decreased at day {}", n);
            previous = current;
        }
    }

    #[test]
    fn return_freezes_fine_at_return_time() {
        let mut record = issued_record(14);
        let frozen = record.finalize_return(day(20), rate()).unwrap();
        assert_eq!(frozen, Decimal::from(6) * rate());
        assert_eq!(record.status, IssueStatus::Returned);
        // Fine stops accruing after the return
        assert_eq!(record.fine_as_of(day(30), rate()), frozen);
    }

    #[test]
    fn on_time_return_carries_no_fine() {
        let mut record = issued_record(14);
        let frozen = record.finalize_return(day(10), rate()).unwrap();
        assert_eq!(frozen, Decimal::ZERO);
    }

    #[test]
    fn second_return_is_invalid() {
        let mut record = issued_record(14);
        record.finalize_return(day(10), rate()).unwrap();
        assert!(matches!(
            record.finalize_return(day(11), rate()),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn return_of_pending_record_is_invalid() {
        let mut record = pending_record();
        assert!(matches!(
            record.finalize_return(day(1), rate()),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn renewal_cap_allows_exactly_max_renewals() {
        let mut record = issued_record(14);
        record.renew(day(1), 2, 14, rate()).unwrap();
        record.renew(day(2), 2, 14, rate()).unwrap();
        assert!(matches!(
            record.renew(day(3), 2, 14, rate()),
            Err(AppError::RenewalLimitExceeded(_))
        ));
        assert_eq!(record.renewal_count, 2);
    }

    #[test]
    fn renew_extends_from_current_due_date() {
        let mut record = issued_record(14);
        record.renew(day(1), 2, 14, rate()).unwrap();
        assert_eq!(record.due_date, Some(day(28)));
    }

    #[test]
    fn renew_while_overdue_is_refused() {
        let mut record = issued_record(14);
        assert!(matches!(
            record.renew(day(20), 2, 14, rate()),
            Err(AppError::AlreadyOverdue(_))
        ));
        assert_eq!(record.renewal_count, 0);
    }

    #[test]
    fn renew_after_return_is_invalid() {
        let mut record = issued_record(14);
        record.finalize_return(day(5), rate()).unwrap();
        assert!(matches!(
            record.renew(day(6), 2, 14, rate()),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn mark_lost_freezes_fine_and_terminates() {
        let mut record = issued_record(14);
        let frozen = record.mark_lost(day(20), rate()).unwrap();
        assert_eq!(frozen, Decimal::from(6) * rate());
        assert_eq!(record.status, IssueStatus::Lost);
        assert_eq!(record.fine_as_of(day(40), rate()), frozen);
        // Terminal: no way back
        assert!(matches!(
            record.finalize_return(day(21), rate()),
            Err(AppError::InvalidTransition(_))
        ));
    }
}
