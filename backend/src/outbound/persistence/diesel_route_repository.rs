//! PostgreSQL-backed `RouteRepository` implementation using Diesel ORM.
//!
//! Counter consistency is the whole point of this adapter: every
//! mutation that touches a stop also touches the parent route's
//! counters, inside one transaction, with the route row locked first
//! (`SELECT ... FOR UPDATE`) so concurrent requests against the same
//! route serialise on the database.

use async_trait::async_trait;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    NewRoute, NewStop, RouteFilter, RouteRepository, RouteRepositoryError, RouteStatusChange,
    StopStatusChange, StopTransition,
};
use crate::domain::route::{
    plan_route_transition, plan_stop_transition, Route, RouteDetail, RouteProgress, RouteStatus,
    Stop, StopProgress, StopStatus,
};

use super::diesel_support::{
    deserialization_error, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    NewRouteRow, NewStopRow, PackageRow, RouteRow, RouteTransitionUpdate, RowConversionError,
    StopRow, StopTransitionUpdate,
};
use super::pool::{DbPool, PoolError};
use super::schema::{packages, routes, stops};

/// Diesel-backed implementation of the `RouteRepository` port.
#[derive(Clone)]
pub struct DieselRouteRepository {
    pool: DbPool,
}

impl DieselRouteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RouteRepositoryError {
    map_basic_pool_error(error, RouteRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> RouteRepositoryError {
    map_basic_diesel_error(
        error,
        RouteRepositoryError::query,
        RouteRepositoryError::connection,
    )
}

fn map_row_error(error: RowConversionError) -> RouteRepositoryError {
    RouteRepositoryError::query(error.to_string())
}

fn map_route_row(row: RouteRow) -> Result<Route, RouteRepositoryError> {
    Route::try_from(row).map_err(map_row_error)
}

fn map_stop_row(row: StopRow) -> Result<Stop, RouteRepositoryError> {
    Stop::try_from(row).map_err(map_row_error)
}

/// Read the caller's route row under `FOR UPDATE`, or `None` when the
/// route does not exist or belongs to someone else.
async fn lock_route(
    conn: &mut diesel_async::AsyncPgConnection,
    user_id: Uuid,
    route_id: Uuid,
) -> Result<Option<RouteRow>, diesel::result::Error> {
    routes::table
        .filter(routes::id.eq(route_id))
        .filter(routes::user_id.eq(user_id))
        .for_update()
        .select(RouteRow::as_select())
        .first(conn)
        .await
        .optional()
}

fn parse_status<T>(raw: &str) -> Result<T, diesel::result::Error>
where
    T: std::str::FromStr<Err = crate::domain::user::UnknownEnumValue>,
{
    raw.parse()
        .map_err(|err| deserialization_error(RowConversionError::Enum(err)))
}

#[async_trait]
impl RouteRepository for DieselRouteRepository {
    async fn insert(&self, route: NewRoute) -> Result<Route, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: RouteRow = diesel::insert_into(routes::table)
            .values(&NewRouteRow {
                id: route.id,
                user_id: route.user_id,
                platform_link_id: route.platform_link_id,
                name: &route.name,
                route_date: route.route_date,
                status: RouteStatus::Assigned.as_str(),
                total_stops: 0,
                completed_stops: 0,
                total_packages: 0,
                delivered_packages: 0,
            })
            .returning(RouteRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        map_route_row(row)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: RouteFilter,
    ) -> Result<Vec<Route>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = routes::table
            .filter(routes::user_id.eq(user_id))
            .into_boxed();
        if let Some(on) = filter.on {
            query = query.filter(routes::route_date.eq(on));
        }
        if let Some(status) = filter.status {
            query = query.filter(routes::status.eq(status.as_str()));
        }

        let rows: Vec<RouteRow> = query
            .order((routes::route_date.desc(), routes::created_at.desc()))
            .select(RouteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(map_route_row).collect()
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<Route>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<RouteRow> = routes::table
            .filter(routes::id.eq(route_id))
            .filter(routes::user_id.eq(user_id))
            .select(RouteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(map_route_row).transpose()
    }

    async fn find_detail(
        &self,
        user_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<RouteDetail>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // One transaction so the route row and its children come from a
        // single snapshot.
        let rows: Option<(RouteRow, Vec<StopRow>, Vec<PackageRow>)> = conn
            .transaction(|conn| {
                async move {
                    let route: Option<RouteRow> = routes::table
                        .filter(routes::id.eq(route_id))
                        .filter(routes::user_id.eq(user_id))
                        .select(RouteRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;

                    let Some(route) = route else {
                        return Ok(None);
                    };

                    let stop_rows: Vec<StopRow> = stops::table
                        .filter(stops::route_id.eq(route_id))
                        .order(stops::sequence.asc())
                        .select(StopRow::as_select())
                        .load(conn)
                        .await?;

                    let package_rows: Vec<PackageRow> = packages::table
                        .filter(packages::route_id.eq(route_id))
                        .order(packages::created_at.asc())
                        .select(PackageRow::as_select())
                        .load(conn)
                        .await?;

                    Ok(Some((route, stop_rows, package_rows)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let Some((route, stop_rows, package_rows)) = rows else {
            return Ok(None);
        };

        Ok(Some(RouteDetail {
            route: map_route_row(route)?,
            stops: stop_rows
                .into_iter()
                .map(map_stop_row)
                .collect::<Result<_, _>>()?,
            packages: package_rows
                .into_iter()
                .map(|row| row.try_into().map_err(map_row_error))
                .collect::<Result<_, _>>()?,
        }))
    }

    async fn apply_route_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        change: RouteStatusChange,
    ) -> Result<Option<Route>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<RouteRow> = conn
            .transaction(|conn| {
                async move {
                    let Some(current) = lock_route(conn, user_id, route_id).await? else {
                        return Ok(None);
                    };

                    let status: RouteStatus = parse_status(&current.status)?;
                    let plan = plan_route_transition(
                        RouteProgress {
                            status,
                            has_started_at: current.started_at.is_some(),
                            has_completed_at: current.completed_at.is_some(),
                        },
                        change.status,
                    );

                    let updated: RouteRow =
                        diesel::update(routes::table.filter(routes::id.eq(route_id)))
                            .set((
                                &RouteTransitionUpdate {
                                    status: change.status.as_str(),
                                    started_at: plan.set_started_at.then_some(change.now),
                                    completed_at: plan.set_completed_at.then_some(change.now),
                                },
                                routes::updated_at.eq(change.now),
                            ))
                            .returning(RouteRow::as_returning())
                            .get_result(conn)
                            .await?;

                    Ok(Some(updated))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        row.map(map_route_row).transpose()
    }

    async fn add_stops(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        new_stops: Vec<NewStop>,
    ) -> Result<Option<Vec<Stop>>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Option<Vec<StopRow>> = conn
            .transaction(|conn| {
                async move {
                    if lock_route(conn, user_id, route_id).await?.is_none() {
                        return Ok(None);
                    }

                    let current_max: Option<i32> = stops::table
                        .filter(stops::route_id.eq(route_id))
                        .select(max(stops::sequence))
                        .first(conn)
                        .await?;

                    // Explicit sequences are honoured; omitted ones are
                    // assigned contiguously after the running maximum.
                    let mut running_max = current_max.unwrap_or(0);
                    let rows: Vec<NewStopRow> = new_stops
                        .into_iter()
                        .map(|stop| {
                            let sequence = stop.sequence.unwrap_or(running_max + 1);
                            running_max = running_max.max(sequence);
                            NewStopRow {
                                id: stop.id,
                                route_id,
                                sequence,
                                address: stop.address,
                                label: stop.label,
                                notes: stop.notes,
                                status: StopStatus::Pending.as_str(),
                            }
                        })
                        .collect();
                    let inserted_count = rows.len() as i32;

                    let inserted: Vec<StopRow> = diesel::insert_into(stops::table)
                        .values(&rows)
                        .returning(StopRow::as_returning())
                        .get_results(conn)
                        .await?;

                    diesel::update(routes::table.filter(routes::id.eq(route_id)))
                        .set(routes::total_stops.eq(routes::total_stops + inserted_count))
                        .execute(conn)
                        .await?;

                    Ok(Some(inserted))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        rows.map(|rows| rows.into_iter().map(map_stop_row).collect())
            .transpose()
    }

    async fn find_stop(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stop_id: Uuid,
    ) -> Result<Option<Stop>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<StopRow> = stops::table
            .inner_join(routes::table)
            .filter(stops::id.eq(stop_id))
            .filter(stops::route_id.eq(route_id))
            .filter(routes::user_id.eq(user_id))
            .select(StopRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(map_stop_row).transpose()
    }

    async fn apply_stop_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stop_id: Uuid,
        change: StopStatusChange,
    ) -> Result<Option<StopTransition>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Option<(StopRow, RouteRow)> = conn
            .transaction(|conn| {
                async move {
                    if lock_route(conn, user_id, route_id).await?.is_none() {
                        return Ok(None);
                    }

                    let current: Option<StopRow> = stops::table
                        .filter(stops::id.eq(stop_id))
                        .filter(stops::route_id.eq(route_id))
                        .for_update()
                        .select(StopRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;

                    let Some(current) = current else {
                        return Ok(None);
                    };

                    let status: StopStatus = parse_status(&current.status)?;
                    let plan = plan_stop_transition(
                        StopProgress {
                            status,
                            has_arrived_at: current.arrived_at.is_some(),
                            has_completed_at: current.completed_at.is_some(),
                        },
                        change.status,
                        change.policy,
                    );

                    let updated_stop: StopRow =
                        diesel::update(stops::table.filter(stops::id.eq(stop_id)))
                            .set(&StopTransitionUpdate {
                                status: change.status.as_str(),
                                notes: change.notes.as_deref(),
                                arrived_at: plan.set_arrived_at.then_some(change.now),
                                completed_at: plan.set_completed_at.then_some(change.now),
                            })
                            .returning(StopRow::as_returning())
                            .get_result(conn)
                            .await?;

                    let updated_route: RouteRow =
                        diesel::update(routes::table.filter(routes::id.eq(route_id)))
                            .set((
                                routes::completed_stops
                                    .eq(routes::completed_stops + plan.completed_delta),
                                routes::updated_at.eq(change.now),
                            ))
                            .returning(RouteRow::as_returning())
                            .get_result(conn)
                            .await?;

                    Ok(Some((updated_stop, updated_route)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        rows.map(|(stop, route)| {
            Ok(StopTransition {
                stop: map_stop_row(stop)?,
                route: map_route_row(route)?,
            })
        })
        .transpose()
    }
}
