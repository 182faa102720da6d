//! Port for hub and membership persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::hub::{Hub, HubMember, HubMembership, HubRole};

use super::define_port_error;

define_port_error! {
    /// Errors raised by hub repository adapters.
    pub enum HubRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "hub repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "hub repository query failed: {message}",
        /// The user already belongs to a hub (memberships are unique per
        /// user).
        DuplicateMembership => "user already belongs to a hub",
    }
}

/// Insert payload for a new hub.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHub {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional city.
    pub city: Option<String>,
    /// Creating user; becomes `OWNER` and is promoted to `HUB_ADMIN`.
    pub created_by: Uuid,
}

/// Insert payload for a membership.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHubMembership {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// The hub to join.
    pub hub_id: Uuid,
    /// The joining user.
    pub user_id: Uuid,
    /// Membership role.
    pub role: HubRole,
}

/// Port for hub reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HubRepository: Send + Sync {
    /// Create a hub, its `OWNER` membership, and the creator's role
    /// promotion to `HUB_ADMIN` in one transaction.
    ///
    /// Fails with [`HubRepositoryError::DuplicateMembership`] when the
    /// creator already belongs to a hub.
    async fn create_with_owner(
        &self,
        hub: NewHub,
        membership_id: Uuid,
    ) -> Result<(Hub, HubMembership), HubRepositoryError>;

    /// Hubs whose name or city contains the query, case-insensitively.
    async fn search(&self, query: &str) -> Result<Vec<Hub>, HubRepositoryError>;

    /// One hub by id.
    async fn find_by_id(&self, hub_id: Uuid) -> Result<Option<Hub>, HubRepositoryError>;

    /// The caller's membership and its hub, if any.
    async fn membership_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(HubMembership, Hub)>, HubRepositoryError>;

    /// Insert a membership.
    ///
    /// Fails with [`HubRepositoryError::DuplicateMembership`] when the
    /// user already belongs to a hub.
    async fn insert_membership(
        &self,
        membership: NewHubMembership,
    ) -> Result<HubMembership, HubRepositoryError>;

    /// Roster of one hub joined with member profiles, oldest member
    /// first.
    async fn list_members(&self, hub_id: Uuid) -> Result<Vec<HubMember>, HubRepositoryError>;
}
