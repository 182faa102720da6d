//! Port for the earnings ledger.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::earnings::{EarningRecord, EarningsSummary};

use super::define_port_error;

define_port_error! {
    /// Errors raised by earnings repository adapters.
    pub enum EarningsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "earnings repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "earnings repository query failed: {message}",
    }
}

/// Insert payload for one ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEarningRecord {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Attribution to one of the worker's platform links.
    pub platform_link_id: Option<Uuid>,
    /// Base pay in cents.
    pub amount_cents: i64,
    /// Tips in cents.
    pub tips_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Day the money was earned.
    pub earned_on: NaiveDate,
    /// Free-form note.
    pub note: Option<String>,
}

/// Date boundaries for the summary aggregates, precomputed by the
/// service so the adapter stays clock-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarningsWindows {
    /// Today's date.
    pub today: NaiveDate,
    /// Seven days back, inclusive.
    pub week_start: NaiveDate,
    /// First of the current month.
    pub month_start: NaiveDate,
}

/// Port for the append-only earnings ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EarningsRepository: Send + Sync {
    /// Append one entry.
    async fn insert(&self, record: NewEarningRecord)
    -> Result<EarningRecord, EarningsRepositoryError>;

    /// Entries of one user, newest first, optionally date-bounded.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<EarningRecord>, EarningsRepositoryError>;

    /// Window totals computed with database-side SUM/COUNT aggregates.
    async fn summarize(
        &self,
        user_id: Uuid,
        windows: EarningsWindows,
    ) -> Result<EarningsSummary, EarningsRepositoryError>;
}
