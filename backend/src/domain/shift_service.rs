//! Shift timer service.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::error::Error;
use super::ports::{NewShift, ShiftRepository, ShiftRepositoryError, ShiftStatusChange};
use super::shift::{Shift, ShiftStatus};

pub(crate) fn map_shift_repo_error(error: ShiftRepositoryError) -> Error {
    match error {
        ShiftRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("shift repository unavailable: {message}"))
        }
        ShiftRepositoryError::Query { message } => {
            Error::internal(format!("shift repository error: {message}"))
        }
    }
}

/// Clock-in / clock-out operations.
#[derive(Clone)]
pub struct ShiftService {
    shifts: Arc<dyn ShiftRepository>,
}

impl ShiftService {
    /// Create the service from its port.
    pub fn new(shifts: Arc<dyn ShiftRepository>) -> Self {
        Self { shifts }
    }

    /// Clock in. At most one `ACTIVE` shift per worker.
    pub async fn start_shift(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Shift, Error> {
        if self
            .shifts
            .find_active_for_user(user_id)
            .await
            .map_err(map_shift_repo_error)?
            .is_some()
        {
            return Err(Error::conflict("a shift is already active"));
        }

        self.shifts
            .insert(NewShift {
                id: Uuid::new_v4(),
                user_id,
                started_at: now,
            })
            .await
            .map_err(map_shift_repo_error)
    }

    /// End or cancel a shift.
    ///
    /// `ended_at` is stamped on the first transition out of `ACTIVE`
    /// only; re-posting the same terminal status is idempotent. Setting
    /// a shift back to `ACTIVE` is not a thing.
    pub async fn update_shift(
        &self,
        user_id: Uuid,
        shift_id: Uuid,
        status: ShiftStatus,
        now: DateTime<Utc>,
    ) -> Result<Shift, Error> {
        if status == ShiftStatus::Active {
            return Err(Error::invalid_request(
                "a shift cannot be moved back to active",
            ));
        }

        self.shifts
            .apply_shift_transition(user_id, shift_id, ShiftStatusChange { status, now })
            .await
            .map_err(map_shift_repo_error)?
            .ok_or_else(|| Error::not_found("shift not found"))
    }

    /// Shifts of the caller, optionally restricted to one day.
    pub async fn list_shifts(
        &self,
        user_id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Shift>, Error> {
        self.shifts
            .list_for_user(user_id, on)
            .await
            .map_err(map_shift_repo_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockShiftRepository;
    use rstest::rstest;

    fn sample_shift(user_id: Uuid) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            user_id,
            status: ShiftStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn starting_with_an_active_shift_is_conflict() {
        let mut shifts = MockShiftRepository::new();
        shifts
            .expect_find_active_for_user()
            .returning(|uid| Ok(Some(sample_shift(uid))));

        let svc = ShiftService::new(Arc::new(shifts));
        let err = svc
            .start_shift(Uuid::new_v4(), Utc::now())
            .await
            .expect_err("already active");
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn starting_fresh_inserts_an_active_shift() {
        let mut shifts = MockShiftRepository::new();
        shifts.expect_find_active_for_user().returning(|_| Ok(None));
        shifts.expect_insert().times(1).returning(|new| {
            Ok(Shift {
                id: new.id,
                user_id: new.user_id,
                status: ShiftStatus::Active,
                started_at: new.started_at,
                ended_at: None,
                created_at: Utc::now(),
            })
        });

        let svc = ShiftService::new(Arc::new(shifts));
        let shift = svc
            .start_shift(Uuid::new_v4(), Utc::now())
            .await
            .expect("clock-in succeeds");
        assert_eq!(shift.status, ShiftStatus::Active);
    }

    #[rstest]
    #[tokio::test]
    async fn reactivating_a_shift_is_invalid() {
        let svc = ShiftService::new(Arc::new(MockShiftRepository::new()));
        let err = svc
            .update_shift(Uuid::new_v4(), Uuid::new_v4(), ShiftStatus::Active, Utc::now())
            .await
            .expect_err("reactivation");
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn ending_a_foreign_shift_is_not_found() {
        let mut shifts = MockShiftRepository::new();
        shifts
            .expect_apply_shift_transition()
            .returning(|_, _, _| Ok(None));

        let svc = ShiftService::new(Arc::new(shifts));
        let err = svc
            .update_shift(
                Uuid::new_v4(),
                Uuid::new_v4(),
                ShiftStatus::Completed,
                Utc::now(),
            )
            .await
            .expect_err("foreign shift");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
