//! PostgreSQL-backed `ShiftRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{NewShift, ShiftRepository, ShiftRepositoryError, ShiftStatusChange};
use crate::domain::shift::{Shift, ShiftStatus};

use super::diesel_support::{
    deserialization_error, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewShiftRow, ShiftRow, ShiftTransitionUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::shifts;

/// Diesel-backed implementation of the `ShiftRepository` port.
#[derive(Clone)]
pub struct DieselShiftRepository {
    pool: DbPool,
}

impl DieselShiftRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ShiftRepositoryError {
    map_basic_pool_error(error, ShiftRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ShiftRepositoryError {
    map_basic_diesel_error(
        error,
        ShiftRepositoryError::query,
        ShiftRepositoryError::connection,
    )
}

fn map_row(row: ShiftRow) -> Result<Shift, ShiftRepositoryError> {
    Shift::try_from(row).map_err(|err| ShiftRepositoryError::query(err.to_string()))
}

#[async_trait]
impl ShiftRepository for DieselShiftRepository {
    async fn insert(&self, shift: NewShift) -> Result<Shift, ShiftRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: ShiftRow = diesel::insert_into(shifts::table)
            .values(&NewShiftRow {
                id: shift.id,
                user_id: shift.user_id,
                status: ShiftStatus::Active.as_str(),
                started_at: shift.started_at,
            })
            .returning(ShiftRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        map_row(row)
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Shift>, ShiftRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ShiftRow> = shifts::table
            .filter(shifts::user_id.eq(user_id))
            .filter(shifts::status.eq(ShiftStatus::Active.as_str()))
            .order(shifts::started_at.desc())
            .select(ShiftRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(map_row).transpose()
    }

    async fn apply_shift_transition(
        &self,
        user_id: Uuid,
        shift_id: Uuid,
        change: ShiftStatusChange,
    ) -> Result<Option<Shift>, ShiftRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ShiftRow> = conn
            .transaction(|conn| {
                async move {
                    let current: Option<ShiftRow> = shifts::table
                        .filter(shifts::id.eq(shift_id))
                        .filter(shifts::user_id.eq(user_id))
                        .for_update()
                        .select(ShiftRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;

                    let Some(current) = current else {
                        return Ok(None);
                    };

                    let current_status: ShiftStatus = current
                        .status
                        .parse()
                        .map_err(|err| deserialization_error(super::models::RowConversionError::Enum(err)))?;

                    // ended_at is stamped exactly once, on the first
                    // transition out of ACTIVE.
                    let ended_at = (current_status == ShiftStatus::Active
                        && change.status != ShiftStatus::Active
                        && current.ended_at.is_none())
                    .then_some(change.now);

                    let updated: ShiftRow = diesel::update(
                        shifts::table.filter(shifts::id.eq(shift_id)),
                    )
                    .set(&ShiftTransitionUpdate {
                        status: change.status.as_str(),
                        ended_at,
                    })
                    .returning(ShiftRow::as_returning())
                    .get_result(conn)
                    .await?;

                    Ok(Some(updated))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        row.map(map_row).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Shift>, ShiftRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = shifts::table
            .filter(shifts::user_id.eq(user_id))
            .into_boxed();
        if let Some(day) = on {
            let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
            let end = start + TimeDelta::days(1);
            query = query.filter(shifts::started_at.ge(start).and(shifts::started_at.lt(end)));
        }

        let rows: Vec<ShiftRow> = query
            .order(shifts::started_at.desc())
            .select(ShiftRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(map_row).collect()
    }
}
