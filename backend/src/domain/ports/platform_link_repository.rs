//! Port for per-user platform link persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::platform::{PlatformLink, PlatformLinkView};

use super::define_port_error;

define_port_error! {
    /// Errors raised by platform link adapters.
    pub enum PlatformLinkRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "platform link repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "platform link repository query failed: {message}",
        /// The (user, platform) pair already has an active link.
        DuplicateLink => "platform is already linked",
    }
}

/// Insert payload for a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlatformLink {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Catalog row to link.
    pub platform_id: Uuid,
    /// Per-user display name override.
    pub display_name: Option<String>,
}

/// Port for reading and writing platform links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformLinkRepository: Send + Sync {
    /// Active links of one user, joined with their catalog rows.
    async fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PlatformLinkView>, PlatformLinkRepositoryError>;

    /// One active link of one user, joined with its catalog row.
    async fn find_for_user(
        &self,
        user_id: Uuid,
        link_id: Uuid,
    ) -> Result<Option<PlatformLinkView>, PlatformLinkRepositoryError>;

    /// Any link (active or soft-deactivated) for the (user, platform) pair.
    async fn find_any_by_platform(
        &self,
        user_id: Uuid,
        platform_id: Uuid,
    ) -> Result<Option<PlatformLink>, PlatformLinkRepositoryError>;

    /// Insert a fresh link.
    ///
    /// Fails with [`PlatformLinkRepositoryError::DuplicateLink`] when an
    /// active link for the pair already exists.
    async fn insert(
        &self,
        link: NewPlatformLink,
    ) -> Result<PlatformLink, PlatformLinkRepositoryError>;

    /// Reactivate a soft-deactivated link in place.
    async fn reactivate(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        display_name: Option<String>,
    ) -> Result<Option<PlatformLink>, PlatformLinkRepositoryError>;

    /// Soft-deactivate a link; returns whether a row changed.
    async fn deactivate(
        &self,
        user_id: Uuid,
        link_id: Uuid,
    ) -> Result<bool, PlatformLinkRepositoryError>;

    /// Stamp `last_accessed_at` and return the refreshed view.
    async fn touch_last_accessed(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PlatformLinkView>, PlatformLinkRepositoryError>;
}
