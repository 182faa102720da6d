//! Port for the delivery platform catalog.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::platform::DeliveryPlatform;

use super::define_port_error;

define_port_error! {
    /// Errors raised by platform catalog adapters.
    pub enum PlatformRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "platform repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "platform repository query failed: {message}",
    }
}

/// Port for reading the catalog. The application never writes it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformRepository: Send + Sync {
    /// Active catalog rows, name-ordered.
    async fn list_active(&self) -> Result<Vec<DeliveryPlatform>, PlatformRepositoryError>;

    /// Active rows whose name contains the query, case-insensitively.
    async fn search_active(
        &self,
        query: &str,
    ) -> Result<Vec<DeliveryPlatform>, PlatformRepositoryError>;

    /// Look up an active row by slug.
    async fn find_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<DeliveryPlatform>, PlatformRepositoryError>;

    /// Look up an active row by id.
    async fn find_active_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<DeliveryPlatform>, PlatformRepositoryError>;
}
