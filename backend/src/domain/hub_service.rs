//! Hub membership service.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::Error;
use super::hub::{Hub, HubMember, HubMembership, HubRole};
use super::ports::{HubRepository, HubRepositoryError, NewHub, NewHubMembership};

const MAX_HUB_NAME_LEN: usize = 80;

fn map_hub_repo_error(error: HubRepositoryError) -> Error {
    match error {
        HubRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("hub repository unavailable: {message}"))
        }
        HubRepositoryError::Query { message } => {
            Error::internal(format!("hub repository error: {message}"))
        }
        HubRepositoryError::DuplicateMembership => {
            Error::conflict("user already belongs to a hub")
        }
    }
}

/// Validated payload for hub creation.
#[derive(Debug, Clone, PartialEq)]
pub struct HubDraft {
    /// Display name.
    pub name: String,
    /// Optional city.
    pub city: Option<String>,
}

/// Validation errors for [`HubDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubDraftValidationError {
    /// The name is empty.
    #[error("hub name must not be empty")]
    EmptyName,
    /// The name exceeds the maximum length.
    #[error("hub name must be at most {MAX_HUB_NAME_LEN} characters")]
    NameTooLong,
}

impl HubDraft {
    /// Validate raw request parts.
    pub fn try_from_parts(
        name: &str,
        city: Option<String>,
    ) -> Result<Self, HubDraftValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HubDraftValidationError::EmptyName);
        }
        if name.chars().count() > MAX_HUB_NAME_LEN {
            return Err(HubDraftValidationError::NameTooLong);
        }
        Ok(Self {
            name: name.to_owned(),
            city: city.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()),
        })
    }
}

/// A membership joined with its hub, the `my hub` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HubWithMembership {
    /// The hub.
    pub hub: Hub,
    /// The caller's membership of it.
    pub membership: HubMembership,
}

/// Hub creation, search, joining, and the role-gated roster.
#[derive(Clone)]
pub struct HubService {
    hubs: Arc<dyn HubRepository>,
}

impl HubService {
    /// Create the service from its port.
    pub fn new(hubs: Arc<dyn HubRepository>) -> Self {
        Self { hubs }
    }

    /// Create a hub with the caller as `OWNER`, promoting them to
    /// `HUB_ADMIN` in the same transaction.
    pub async fn create_hub(
        &self,
        user_id: Uuid,
        draft: HubDraft,
    ) -> Result<HubWithMembership, Error> {
        // The unique index on memberships backs this check; the
        // pre-check exists for the friendlier message.
        if self
            .hubs
            .membership_for_user(user_id)
            .await
            .map_err(map_hub_repo_error)?
            .is_some()
        {
            return Err(Error::conflict("user already belongs to a hub"));
        }

        let (hub, membership) = self
            .hubs
            .create_with_owner(
                NewHub {
                    id: Uuid::new_v4(),
                    name: draft.name,
                    city: draft.city,
                    created_by: user_id,
                },
                Uuid::new_v4(),
            )
            .await
            .map_err(map_hub_repo_error)?;

        Ok(HubWithMembership { hub, membership })
    }

    /// Hubs matching the query; an empty query lists everything.
    pub async fn search_hubs(&self, query: &str) -> Result<Vec<Hub>, Error> {
        self.hubs
            .search(query.trim())
            .await
            .map_err(map_hub_repo_error)
    }

    /// The caller's hub and membership.
    pub async fn my_hub(&self, user_id: Uuid) -> Result<HubWithMembership, Error> {
        let (membership, hub) = self
            .hubs
            .membership_for_user(user_id)
            .await
            .map_err(map_hub_repo_error)?
            .ok_or_else(|| Error::not_found("no hub membership"))?;
        Ok(HubWithMembership { hub, membership })
    }

    /// Join a hub as `DRIVER`.
    pub async fn join_hub(&self, user_id: Uuid, hub_id: Uuid) -> Result<HubMembership, Error> {
        self.hubs
            .find_by_id(hub_id)
            .await
            .map_err(map_hub_repo_error)?
            .ok_or_else(|| Error::not_found("hub not found"))?;

        if self
            .hubs
            .membership_for_user(user_id)
            .await
            .map_err(map_hub_repo_error)?
            .is_some()
        {
            return Err(Error::conflict("user already belongs to a hub"));
        }

        self.hubs
            .insert_membership(NewHubMembership {
                id: Uuid::new_v4(),
                hub_id,
                user_id,
                role: HubRole::Driver,
            })
            .await
            .map_err(map_hub_repo_error)
    }

    /// Roster of a hub; requires a staff membership of that hub.
    pub async fn list_members(
        &self,
        user_id: Uuid,
        hub_id: Uuid,
    ) -> Result<Vec<HubMember>, Error> {
        let membership = self
            .hubs
            .membership_for_user(user_id)
            .await
            .map_err(map_hub_repo_error)?
            .filter(|(membership, _)| membership.hub_id == hub_id)
            .ok_or_else(|| Error::forbidden("not a member of this hub"))?
            .0;

        if !membership.role.can_list_members() {
            return Err(Error::forbidden("drivers cannot list hub members"));
        }

        self.hubs
            .list_members(hub_id)
            .await
            .map_err(map_hub_repo_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockHubRepository;
    use chrono::Utc;
    use rstest::rstest;

    fn sample_hub(id: Uuid) -> Hub {
        Hub {
            id,
            name: "North Depot".to_owned(),
            city: Some("Leeds".to_owned()),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    fn sample_membership(hub_id: Uuid, user_id: Uuid, role: HubRole) -> HubMembership {
        HubMembership {
            id: Uuid::new_v4(),
            hub_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn creating_a_second_hub_membership_is_conflict() {
        let mut hubs = MockHubRepository::new();
        hubs.expect_membership_for_user().returning(|uid| {
            let hub_id = Uuid::new_v4();
            Ok(Some((
                sample_membership(hub_id, uid, HubRole::Driver),
                sample_hub(hub_id),
            )))
        });

        let svc = HubService::new(Arc::new(hubs));
        let draft = HubDraft::try_from_parts("South Depot", None).expect("valid draft");
        let err = svc
            .create_hub(Uuid::new_v4(), draft)
            .await
            .expect_err("second membership");
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn joining_an_unknown_hub_is_not_found() {
        let mut hubs = MockHubRepository::new();
        hubs.expect_find_by_id().returning(|_| Ok(None));

        let svc = HubService::new(Arc::new(hubs));
        let err = svc
            .join_hub(Uuid::new_v4(), Uuid::new_v4())
            .await
            .expect_err("unknown hub");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[rstest]
    #[case(HubRole::Driver, false)]
    #[case(HubRole::Dispatcher, true)]
    #[case(HubRole::Owner, true)]
    #[tokio::test]
    async fn roster_is_role_gated(#[case] role: HubRole, #[case] allowed: bool) {
        let hub_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut hubs = MockHubRepository::new();
        hubs.expect_membership_for_user().returning(move |uid| {
            Ok(Some((
                sample_membership(hub_id, uid, role),
                sample_hub(hub_id),
            )))
        });
        hubs.expect_list_members().returning(|_| Ok(Vec::new()));

        let svc = HubService::new(Arc::new(hubs));
        let result = svc.list_members(user_id, hub_id).await;
        if allowed {
            assert!(result.is_ok());
        } else {
            assert_eq!(result.expect_err("gated").code, ErrorCode::Forbidden);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn roster_of_another_hub_is_forbidden() {
        let user_id = Uuid::new_v4();
        let my_hub = Uuid::new_v4();
        let other_hub = Uuid::new_v4();

        let mut hubs = MockHubRepository::new();
        hubs.expect_membership_for_user().returning(move |uid| {
            Ok(Some((
                sample_membership(my_hub, uid, HubRole::Owner),
                sample_hub(my_hub),
            )))
        });

        let svc = HubService::new(Arc::new(hubs));
        let err = svc
            .list_members(user_id, other_hub)
            .await
            .expect_err("foreign hub");
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
