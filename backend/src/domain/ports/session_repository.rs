//! Port for session-token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by session repository adapters.
    pub enum SessionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "session repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "session repository query failed: {message}",
    }
}

/// One issued token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Primary key.
    pub id: Uuid,
    /// Owning account.
    pub user_id: Uuid,
    /// The signed token as presented by clients.
    pub token: String,
    /// Hard expiry; rows past this are prunable.
    pub expires_at: DateTime<Utc>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a freshly issued token.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Owning account.
    pub user_id: Uuid,
    /// The signed token.
    pub token: String,
    /// Hard expiry.
    pub expires_at: DateTime<Utc>,
}

/// Port for the session-token store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Record a freshly issued token.
    async fn insert(&self, session: NewSession) -> Result<Session, SessionRepositoryError>;

    /// Delete the row holding exactly this token.
    ///
    /// Returns whether a row was deleted. Other sessions of the same user
    /// are left alone.
    async fn delete_by_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<bool, SessionRepositoryError>;

    /// Prune this user's expired sessions; returns the number removed.
    async fn delete_expired_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, SessionRepositoryError>;
}
