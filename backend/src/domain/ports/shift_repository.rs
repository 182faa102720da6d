//! Port for shift persistence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::shift::{Shift, ShiftStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by shift repository adapters.
    pub enum ShiftRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "shift repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "shift repository query failed: {message}",
    }
}

/// Insert payload for a clock-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShift {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Clock-in time.
    pub started_at: DateTime<Utc>,
}

/// A requested shift status change.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftStatusChange {
    /// Target status.
    pub status: ShiftStatus,
    /// Stamp for `ended_at` on the first transition out of `ACTIVE`.
    pub now: DateTime<Utc>,
}

/// Port for shift reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShiftRepository: Send + Sync {
    /// Record a clock-in with `ACTIVE` status.
    async fn insert(&self, shift: NewShift) -> Result<Shift, ShiftRepositoryError>;

    /// The user's currently `ACTIVE` shift, if any.
    async fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Shift>, ShiftRepositoryError>;

    /// Apply a status change; `ended_at` is stamped only on the first
    /// transition out of `ACTIVE` and never overwritten.
    async fn apply_shift_transition(
        &self,
        user_id: Uuid,
        shift_id: Uuid,
        change: ShiftStatusChange,
    ) -> Result<Option<Shift>, ShiftRepositoryError>;

    /// Shifts of one user, newest first, optionally restricted to shifts
    /// started on one day.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Shift>, ShiftRepositoryError>;
}
