//! PostgreSQL-backed `PlatformLinkRepository` implementation using Diesel
//! ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::platform::{PlatformLink, PlatformLinkView};
use crate::domain::ports::{
    NewPlatformLink, PlatformLinkRepository, PlatformLinkRepositoryError,
};

use super::diesel_support::{is_unique_violation, map_basic_diesel_error, map_basic_pool_error};
use super::models::{DeliveryPlatformRow, NewPlatformLinkRow, PlatformLinkRow};
use super::pool::{DbPool, PoolError};
use super::schema::{delivery_platforms, platform_links};

/// Diesel-backed implementation of the `PlatformLinkRepository` port.
#[derive(Clone)]
pub struct DieselPlatformLinkRepository {
    pool: DbPool,
}

impl DieselPlatformLinkRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PlatformLinkRepositoryError {
    map_basic_pool_error(error, PlatformLinkRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PlatformLinkRepositoryError {
    if is_unique_violation(&error) {
        return PlatformLinkRepositoryError::duplicate_link();
    }
    map_basic_diesel_error(
        error,
        PlatformLinkRepositoryError::query,
        PlatformLinkRepositoryError::connection,
    )
}

fn view_from_rows(link: PlatformLinkRow, platform: DeliveryPlatformRow) -> PlatformLinkView {
    PlatformLinkView {
        link: link.into(),
        platform: platform.into(),
    }
}

/// Changeset for reactivating a soft-deactivated link. A `None` display
/// name keeps the stored one.
#[derive(AsChangeset)]
#[diesel(table_name = platform_links)]
struct ReactivateLinkUpdate<'a> {
    is_active: bool,
    display_name: Option<&'a str>,
}

#[async_trait]
impl PlatformLinkRepository for DieselPlatformLinkRepository {
    async fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PlatformLinkView>, PlatformLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(PlatformLinkRow, DeliveryPlatformRow)> = platform_links::table
            .inner_join(delivery_platforms::table)
            .filter(platform_links::user_id.eq(user_id))
            .filter(platform_links::is_active.eq(true))
            .order(platform_links::created_at.asc())
            .select((
                PlatformLinkRow::as_select(),
                DeliveryPlatformRow::as_select(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(link, platform)| view_from_rows(link, platform))
            .collect())
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        link_id: Uuid,
    ) -> Result<Option<PlatformLinkView>, PlatformLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(PlatformLinkRow, DeliveryPlatformRow)> = platform_links::table
            .inner_join(delivery_platforms::table)
            .filter(platform_links::id.eq(link_id))
            .filter(platform_links::user_id.eq(user_id))
            .filter(platform_links::is_active.eq(true))
            .select((
                PlatformLinkRow::as_select(),
                DeliveryPlatformRow::as_select(),
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(|(link, platform)| view_from_rows(link, platform)))
    }

    async fn find_any_by_platform(
        &self,
        user_id: Uuid,
        platform_id: Uuid,
    ) -> Result<Option<PlatformLink>, PlatformLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PlatformLinkRow> = platform_links::table
            .filter(platform_links::user_id.eq(user_id))
            .filter(platform_links::platform_id.eq(platform_id))
            .select(PlatformLinkRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Into::into))
    }

    async fn insert(
        &self,
        link: NewPlatformLink,
    ) -> Result<PlatformLink, PlatformLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: PlatformLinkRow = diesel::insert_into(platform_links::table)
            .values(&NewPlatformLinkRow {
                id: link.id,
                user_id: link.user_id,
                platform_id: link.platform_id,
                display_name: link.display_name.as_deref(),
                is_active: true,
            })
            .returning(PlatformLinkRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row.into())
    }

    async fn reactivate(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        display_name: Option<String>,
    ) -> Result<Option<PlatformLink>, PlatformLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PlatformLinkRow> = diesel::update(
            platform_links::table
                .filter(platform_links::id.eq(link_id))
                .filter(platform_links::user_id.eq(user_id)),
        )
        .set(&ReactivateLinkUpdate {
            is_active: true,
            display_name: display_name.as_deref(),
        })
        .returning(PlatformLinkRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        Ok(row.map(Into::into))
    }

    async fn deactivate(
        &self,
        user_id: Uuid,
        link_id: Uuid,
    ) -> Result<bool, PlatformLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changed = diesel::update(
            platform_links::table
                .filter(platform_links::id.eq(link_id))
                .filter(platform_links::user_id.eq(user_id))
                .filter(platform_links::is_active.eq(true)),
        )
        .set(platform_links::is_active.eq(false))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(changed > 0)
    }

    async fn touch_last_accessed(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PlatformLinkView>, PlatformLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PlatformLinkRow> = diesel::update(
            platform_links::table
                .filter(platform_links::id.eq(link_id))
                .filter(platform_links::user_id.eq(user_id))
                .filter(platform_links::is_active.eq(true)),
        )
        .set(platform_links::last_accessed_at.eq(now))
        .returning(PlatformLinkRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        let Some(link) = row else {
            return Ok(None);
        };

        let platform: DeliveryPlatformRow = delivery_platforms::table
            .filter(delivery_platforms::id.eq(link.platform_id))
            .select(DeliveryPlatformRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Some(view_from_rows(link, platform)))
    }
}
