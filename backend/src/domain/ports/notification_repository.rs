//! Port for notification reads.
//!
//! Only the unread count is surfaced today (the dashboard badge);
//! delivery of notifications happens out of band.

use async_trait::async_trait;
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Port for reading notification state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Number of unread notifications for one user.
    async fn unread_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, NotificationRepositoryError>;
}
