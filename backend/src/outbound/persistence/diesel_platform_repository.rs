//! PostgreSQL-backed `PlatformRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::platform::DeliveryPlatform;
use crate::domain::ports::{PlatformRepository, PlatformRepositoryError};

use super::diesel_support::{contains_pattern, map_basic_diesel_error, map_basic_pool_error};
use super::models::DeliveryPlatformRow;
use super::pool::{DbPool, PoolError};
use super::schema::delivery_platforms;

/// Diesel-backed implementation of the `PlatformRepository` port.
#[derive(Clone)]
pub struct DieselPlatformRepository {
    pool: DbPool,
}

impl DieselPlatformRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PlatformRepositoryError {
    map_basic_pool_error(error, PlatformRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PlatformRepositoryError {
    map_basic_diesel_error(
        error,
        PlatformRepositoryError::query,
        PlatformRepositoryError::connection,
    )
}

#[async_trait]
impl PlatformRepository for DieselPlatformRepository {
    async fn list_active(&self) -> Result<Vec<DeliveryPlatform>, PlatformRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DeliveryPlatformRow> = delivery_platforms::table
            .filter(delivery_platforms::is_active.eq(true))
            .order(delivery_platforms::name.asc())
            .select(DeliveryPlatformRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_active(
        &self,
        query: &str,
    ) -> Result<Vec<DeliveryPlatform>, PlatformRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DeliveryPlatformRow> = delivery_platforms::table
            .filter(delivery_platforms::is_active.eq(true))
            .filter(delivery_platforms::name.ilike(contains_pattern(query)))
            .order(delivery_platforms::name.asc())
            .select(DeliveryPlatformRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<DeliveryPlatform>, PlatformRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DeliveryPlatformRow> = delivery_platforms::table
            .filter(delivery_platforms::is_active.eq(true))
            .filter(delivery_platforms::slug.eq(slug))
            .select(DeliveryPlatformRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_active_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<DeliveryPlatform>, PlatformRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DeliveryPlatformRow> = delivery_platforms::table
            .filter(delivery_platforms::is_active.eq(true))
            .filter(delivery_platforms::id.eq(id))
            .select(DeliveryPlatformRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Into::into))
    }
}
