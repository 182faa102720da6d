//! Read-only catalog service for delivery platforms.

use std::sync::Arc;

use super::error::Error;
use super::platform::DeliveryPlatform;
use super::ports::{PlatformRepository, PlatformRepositoryError};

pub(crate) fn map_platform_repo_error(error: PlatformRepositoryError) -> Error {
    match error {
        PlatformRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("platform repository unavailable: {message}"))
        }
        PlatformRepositoryError::Query { message } => {
            Error::internal(format!("platform repository error: {message}"))
        }
    }
}

/// Catalog queries. The application never writes the catalog.
#[derive(Clone)]
pub struct PlatformService {
    platforms: Arc<dyn PlatformRepository>,
}

impl PlatformService {
    /// Create the service from its port.
    pub fn new(platforms: Arc<dyn PlatformRepository>) -> Self {
        Self { platforms }
    }

    /// Active catalog rows, name-ordered.
    pub async fn list_platforms(&self) -> Result<Vec<DeliveryPlatform>, Error> {
        self.platforms
            .list_active()
            .await
            .map_err(map_platform_repo_error)
    }

    /// Case-insensitive name search over active rows.
    pub async fn search_platforms(&self, query: &str) -> Result<Vec<DeliveryPlatform>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_request("search query must not be empty"));
        }
        self.platforms
            .search_active(query)
            .await
            .map_err(map_platform_repo_error)
    }

    /// One active catalog row by slug.
    pub async fn platform_by_slug(&self, slug: &str) -> Result<DeliveryPlatform, Error> {
        self.platforms
            .find_active_by_slug(slug)
            .await
            .map_err(map_platform_repo_error)?
            .ok_or_else(|| Error::not_found("platform not found"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockPlatformRepository;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn blank_search_is_rejected_before_the_repository() {
        let svc = PlatformService::new(Arc::new(MockPlatformRepository::new()));
        let err = svc.search_platforms("   ").await.expect_err("blank query");
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let mut platforms = MockPlatformRepository::new();
        platforms
            .expect_find_active_by_slug()
            .returning(|_| Ok(None));

        let svc = PlatformService::new(Arc::new(platforms));
        let err = svc.platform_by_slug("ghost").await.expect_err("missing");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
