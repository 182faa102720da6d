//! PostgreSQL-backed `PackageRepository` implementation using Diesel ORM.
//!
//! Shares the route repository's locking discipline: the route row is
//! read `FOR UPDATE` before any package write, so `delivered_packages`
//! and `total_packages` move in the same transaction as the package row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    NewPackage, PackageRepository, PackageRepositoryError, PackageStatusChange, PackageTransition,
};
use crate::domain::route::{
    plan_package_transition, CounterPolicy, Package, PackageProgress, PackageStatus, Route,
};

use super::diesel_support::{
    deserialization_error, is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    NewPackageRow, PackageRow, PackageTransitionUpdate, RouteRow, RowConversionError,
};
use super::pool::{DbPool, PoolError};
use super::schema::{packages, routes};

/// Diesel-backed implementation of the `PackageRepository` port.
#[derive(Clone)]
pub struct DieselPackageRepository {
    pool: DbPool,
}

impl DieselPackageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PackageRepositoryError {
    map_basic_pool_error(error, PackageRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PackageRepositoryError {
    if is_unique_violation(&error) {
        return PackageRepositoryError::duplicate_barcode();
    }
    map_basic_diesel_error(
        error,
        PackageRepositoryError::query,
        PackageRepositoryError::connection,
    )
}

fn map_row_error(error: RowConversionError) -> PackageRepositoryError {
    PackageRepositoryError::query(error.to_string())
}

fn map_package_row(row: PackageRow) -> Result<Package, PackageRepositoryError> {
    Package::try_from(row).map_err(map_row_error)
}

fn map_route_row(row: RouteRow) -> Result<Route, PackageRepositoryError> {
    Route::try_from(row).map_err(map_row_error)
}

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

/// Apply a planned transition to a locked package row and the route
/// counters, returning the refreshed rows.
async fn apply_transition(
    conn: &mut diesel_async::AsyncPgConnection,
    route_id: Uuid,
    current: PackageRow,
    next_status: PackageStatus,
    notes: Option<&str>,
    recipient_name: Option<&str>,
    now: DateTime<Utc>,
    policy: CounterPolicy,
) -> Result<(PackageRow, RouteRow), diesel::result::Error> {
    let status: PackageStatus = current
        .status
        .parse()
        .map_err(|err| deserialization_error(RowConversionError::Enum(err)))?;

    let plan = plan_package_transition(
        PackageProgress {
            status,
            has_scanned_at: current.scanned_at.is_some(),
            has_delivered_at: current.delivered_at.is_some(),
        },
        next_status,
        policy,
    );

    let updated_package: PackageRow =
        diesel::update(packages::table.filter(packages::id.eq(current.id)))
            .set(&PackageTransitionUpdate {
                status: next_status.as_str(),
                notes,
                recipient_name,
                scanned_at: plan.set_scanned_at.then_some(now),
                delivered_at: plan.set_delivered_at.then_some(now),
            })
            .returning(PackageRow::as_returning())
            .get_result(conn)
            .await?;

    let updated_route: RouteRow = diesel::update(routes::table.filter(routes::id.eq(route_id)))
        .set((
            routes::delivered_packages.eq(routes::delivered_packages + plan.delivered_delta),
            routes::updated_at.eq(now),
        ))
        .returning(RouteRow::as_returning())
        .get_result(conn)
        .await?;

    Ok((updated_package, updated_route))
}

#[async_trait]
impl PackageRepository for DieselPackageRepository {
    async fn insert(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        package: NewPackage,
    ) -> Result<Option<Package>, PackageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PackageRow> = conn
            .transaction(|conn| {
                async move {
                    if lock_route(conn, user_id, route_id).await?.is_none() {
                        return Ok(None);
                    }

                    let inserted: PackageRow = diesel::insert_into(packages::table)
                        .values(&NewPackageRow {
                            id: package.id,
                            route_id,
                            stop_id: package.stop_id,
                            tracking_number: &package.tracking_number,
                            barcode: package.barcode.as_deref(),
                            status: PackageStatus::ScannedIn.as_str(),
                            scanned_at: Some(package.scanned_at),
                        })
                        .returning(PackageRow::as_returning())
                        .get_result(conn)
                        .await?;

                    diesel::update(routes::table.filter(routes::id.eq(route_id)))
                        .set((
                            routes::total_packages.eq(routes::total_packages + 1),
                            routes::updated_at.eq(package.scanned_at),
                        ))
                        .execute(conn)
                        .await?;

                    Ok(Some(inserted))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        row.map(map_package_row).transpose()
    }

    async fn list_for_route(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        status: Option<PackageStatus>,
    ) -> Result<Vec<Package>, PackageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = packages::table
            .inner_join(routes::table)
            .filter(packages::route_id.eq(route_id))
            .filter(routes::user_id.eq(user_id))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(packages::status.eq(status.as_str()));
        }

        let rows: Vec<PackageRow> = query
            .order(packages::created_at.asc())
            .select(PackageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(map_package_row).collect()
    }

    async fn apply_scan(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        barcode: &str,
        now: DateTime<Utc>,
        policy: CounterPolicy,
    ) -> Result<Option<PackageTransition>, PackageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let barcode = barcode.to_owned();
        let rows: Option<(PackageRow, RouteRow)> = conn
            .transaction(|conn| {
                async move {
                    if lock_route(conn, user_id, route_id).await?.is_none() {
                        return Ok(None);
                    }

                    let current: Option<PackageRow> = packages::table
                        .filter(packages::route_id.eq(route_id))
                        .filter(packages::barcode.eq(&barcode))
                        .for_update()
                        .select(PackageRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;

                    let Some(current) = current else {
                        return Ok(None);
                    };

                    let next = current
                        .status
                        .parse::<PackageStatus>()
                        .map_err(|err| deserialization_error(RowConversionError::Enum(err)))?
                        .next_scan_status();

                    apply_transition(conn, route_id, current, next, None, None, now, policy)
                        .await
                        .map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        rows.map(|(package, route)| {
            Ok(PackageTransition {
                package: map_package_row(package)?,
                route: map_route_row(route)?,
            })
        })
        .transpose()
    }

    async fn apply_package_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        package_id: Uuid,
        change: PackageStatusChange,
    ) -> Result<Option<PackageTransition>, PackageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Option<(PackageRow, RouteRow)> = conn
            .transaction(|conn| {
                async move {
                    if lock_route(conn, user_id, route_id).await?.is_none() {
                        return Ok(None);
                    }

                    let current: Option<PackageRow> = packages::table
                        .filter(packages::id.eq(package_id))
                        .filter(packages::route_id.eq(route_id))
                        .for_update()
                        .select(PackageRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;

                    let Some(current) = current else {
                        return Ok(None);
                    };

                    apply_transition(
                        conn,
                        route_id,
                        current,
                        change.status,
                        change.notes.as_deref(),
                        change.recipient_name.as_deref(),
                        change.now,
                        change.policy,
                    )
                    .await
                    .map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        rows.map(|(package, route)| {
            Ok(PackageTransition {
                package: map_package_row(package)?,
                route: map_route_row(route)?,
            })
        })
        .transpose()
    }
}
