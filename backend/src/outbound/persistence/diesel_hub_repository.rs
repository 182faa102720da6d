//! PostgreSQL-backed `HubRepository` implementation using Diesel ORM.
//!
//! Hub creation is the one place the users table is written outside the
//! account layer: the creator's role promotion rides in the same
//! transaction as the hub and membership inserts, so a failure leaves
//! no half-created hub.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::hub::{Hub, HubMember, HubMembership, HubRole};
use crate::domain::ports::{HubRepository, HubRepositoryError, NewHub, NewHubMembership};
use crate::domain::user::UserRole;

use super::diesel_support::{
    contains_pattern, is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{HubMembershipRow, HubRow, NewHubMembershipRow, NewHubRow};
use super::pool::{DbPool, PoolError};
use super::schema::{hub_memberships, hubs, users};

/// Diesel-backed implementation of the `HubRepository` port.
#[derive(Clone)]
pub struct DieselHubRepository {
    pool: DbPool,
}

impl DieselHubRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> HubRepositoryError {
    map_basic_pool_error(error, HubRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> HubRepositoryError {
    if is_unique_violation(&error) {
        return HubRepositoryError::duplicate_membership();
    }
    map_basic_diesel_error(
        error,
        HubRepositoryError::query,
        HubRepositoryError::connection,
    )
}

fn map_membership_row(row: HubMembershipRow) -> Result<HubMembership, HubRepositoryError> {
    HubMembership::try_from(row).map_err(|err| HubRepositoryError::query(err.to_string()))
}

#[async_trait]
impl HubRepository for DieselHubRepository {
    async fn create_with_owner(
        &self,
        hub: NewHub,
        membership_id: Uuid,
    ) -> Result<(Hub, HubMembership), HubRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let created_by = hub.created_by;
        let (hub_row, membership_row) = conn
            .transaction(|conn| {
                async move {
                    let hub_row: HubRow = diesel::insert_into(hubs::table)
                        .values(&NewHubRow {
                            id: hub.id,
                            name: &hub.name,
                            city: hub.city.as_deref(),
                            created_by,
                        })
                        .returning(HubRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let membership_row: HubMembershipRow =
                        diesel::insert_into(hub_memberships::table)
                            .values(&NewHubMembershipRow {
                                id: membership_id,
                                hub_id: hub_row.id,
                                user_id: created_by,
                                role: HubRole::Owner.as_str(),
                            })
                            .returning(HubMembershipRow::as_returning())
                            .get_result(conn)
                            .await?;

                    // Promote workers only; admin roles are never
                    // downgraded or sideways-moved by hub creation.
                    diesel::update(
                        users::table
                            .filter(users::id.eq(created_by))
                            .filter(users::role.eq(UserRole::Worker.as_str())),
                    )
                    .set(users::role.eq(UserRole::HubAdmin.as_str()))
                    .execute(conn)
                    .await?;

                    Ok((hub_row, membership_row))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok((hub_row.into(), map_membership_row(membership_row)?))
    }

    async fn search(&self, query: &str) -> Result<Vec<Hub>, HubRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut stmt = hubs::table.into_boxed();
        if !query.is_empty() {
            let pattern = contains_pattern(query);
            stmt = stmt.filter(
                hubs::name
                    .ilike(pattern.clone())
                    .nullable()
                    .or(hubs::city.ilike(pattern)),
            );
        }

        let rows: Vec<HubRow> = stmt
            .order(hubs::name.asc())
            .select(HubRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, hub_id: Uuid) -> Result<Option<Hub>, HubRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<HubRow> = hubs::table
            .filter(hubs::id.eq(hub_id))
            .select(HubRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Into::into))
    }

    async fn membership_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(HubMembership, Hub)>, HubRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(HubMembershipRow, HubRow)> = hub_memberships::table
            .inner_join(hubs::table)
            .filter(hub_memberships::user_id.eq(user_id))
            .select((HubMembershipRow::as_select(), HubRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(membership, hub)| Ok((map_membership_row(membership)?, hub.into())))
            .transpose()
    }

    async fn insert_membership(
        &self,
        membership: NewHubMembership,
    ) -> Result<HubMembership, HubRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: HubMembershipRow = diesel::insert_into(hub_memberships::table)
            .values(&NewHubMembershipRow {
                id: membership.id,
                hub_id: membership.hub_id,
                user_id: membership.user_id,
                role: membership.role.as_str(),
            })
            .returning(HubMembershipRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        map_membership_row(row)
    }

    async fn list_members(&self, hub_id: Uuid) -> Result<Vec<HubMember>, HubRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(HubMembershipRow, String, String)> = hub_memberships::table
            .inner_join(users::table)
            .filter(hub_memberships::hub_id.eq(hub_id))
            .order(hub_memberships::joined_at.asc())
            .select((
                HubMembershipRow::as_select(),
                users::display_name,
                users::email,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(membership, display_name, email)| {
                Ok(HubMember {
                    membership: map_membership_row(membership)?,
                    display_name,
                    email,
                })
            })
            .collect()
    }
}
