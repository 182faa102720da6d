//! PostgreSQL-backed `EarningsRepository` implementation using Diesel ORM.
//!
//! The summary aggregates run database-side with SUM/COUNT, one grouped
//! query per window, in contrast to the dashboard's in-process fold.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::earnings::{EarningRecord, EarningsSummary, EarningsTotals};
use crate::domain::ports::{
    EarningsRepository, EarningsRepositoryError, EarningsWindows, NewEarningRecord,
};

use super::diesel_support::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{EarningRecordRow, NewEarningRecordRow};
use super::pool::{DbPool, PoolError};
use super::schema::earning_records;

/// Totals of records earned on exactly the bound date.
const TOTALS_ON_DAY_SQL: &str = "SELECT \
     COALESCE(SUM(amount_cents), 0)::bigint AS amount_cents, \
     COALESCE(SUM(tips_cents), 0)::bigint AS tips_cents, \
     COUNT(*)::bigint AS record_count \
     FROM earning_records WHERE user_id = $1 AND earned_on = $2";

/// Totals of records earned on or after the bound date.
const TOTALS_SINCE_SQL: &str = "SELECT \
     COALESCE(SUM(amount_cents), 0)::bigint AS amount_cents, \
     COALESCE(SUM(tips_cents), 0)::bigint AS tips_cents, \
     COUNT(*)::bigint AS record_count \
     FROM earning_records WHERE user_id = $1 AND earned_on >= $2";

/// Totals over the whole ledger.
const TOTALS_ALL_TIME_SQL: &str = "SELECT \
     COALESCE(SUM(amount_cents), 0)::bigint AS amount_cents, \
     COALESCE(SUM(tips_cents), 0)::bigint AS tips_cents, \
     COUNT(*)::bigint AS record_count \
     FROM earning_records WHERE user_id = $1";

#[derive(QueryableByName)]
struct TotalsRow {
    #[diesel(sql_type = BigInt)]
    amount_cents: i64,
    #[diesel(sql_type = BigInt)]
    tips_cents: i64,
    #[diesel(sql_type = BigInt)]
    record_count: i64,
}

impl From<TotalsRow> for EarningsTotals {
    fn from(row: TotalsRow) -> Self {
        Self {
            amount_cents: row.amount_cents,
            tips_cents: row.tips_cents,
            record_count: row.record_count,
        }
    }
}

/// Diesel-backed implementation of the `EarningsRepository` port.
#[derive(Clone)]
pub struct DieselEarningsRepository {
    pool: DbPool,
}

impl DieselEarningsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EarningsRepositoryError {
    map_basic_pool_error(error, EarningsRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EarningsRepositoryError {
    map_basic_diesel_error(
        error,
        EarningsRepositoryError::query,
        EarningsRepositoryError::connection,
    )
}

#[async_trait]
impl EarningsRepository for DieselEarningsRepository {
    async fn insert(
        &self,
        record: NewEarningRecord,
    ) -> Result<EarningRecord, EarningsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: EarningRecordRow = diesel::insert_into(earning_records::table)
            .values(&NewEarningRecordRow {
                id: record.id,
                user_id: record.user_id,
                platform_link_id: record.platform_link_id,
                amount_cents: record.amount_cents,
                tips_cents: record.tips_cents,
                currency: &record.currency,
                earned_on: record.earned_on,
                note: record.note.as_deref(),
            })
            .returning(EarningRecordRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row.into())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<EarningRecord>, EarningsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = earning_records::table
            .filter(earning_records::user_id.eq(user_id))
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(earning_records::earned_on.ge(from));
        }
        if let Some(to) = to {
            query = query.filter(earning_records::earned_on.le(to));
        }

        let rows: Vec<EarningRecordRow> = query
            .order((
                earning_records::earned_on.desc(),
                earning_records::created_at.desc(),
            ))
            .select(EarningRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn summarize(
        &self,
        user_id: Uuid,
        windows: EarningsWindows,
    ) -> Result<EarningsSummary, EarningsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let today: TotalsRow = diesel::sql_query(TOTALS_ON_DAY_SQL)
            .bind::<SqlUuid, _>(user_id)
            .bind::<Date, _>(windows.today)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let week: TotalsRow = diesel::sql_query(TOTALS_SINCE_SQL)
            .bind::<SqlUuid, _>(user_id)
            .bind::<Date, _>(windows.week_start)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let month: TotalsRow = diesel::sql_query(TOTALS_SINCE_SQL)
            .bind::<SqlUuid, _>(user_id)
            .bind::<Date, _>(windows.month_start)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let all_time: TotalsRow = diesel::sql_query(TOTALS_ALL_TIME_SQL)
            .bind::<SqlUuid, _>(user_id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(EarningsSummary {
            today: today.into(),
            week: week.into(),
            month: month.into(),
            all_time: all_time.into(),
        })
    }
}
