//! Hubs: organisational groupings of workers with role-based membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UnknownEnumValue;

/// Membership role inside a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HubRole {
    /// Ordinary member.
    Driver,
    /// Coordinates routes for drivers.
    Dispatcher,
    /// Runs day-to-day operations.
    Manager,
    /// Created the hub.
    Owner,
}

impl HubRole {
    /// Stable string form used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Driver => "DRIVER",
            Self::Dispatcher => "DISPATCHER",
            Self::Manager => "MANAGER",
            Self::Owner => "OWNER",
        }
    }

    /// Whether this role may list a hub's members.
    ///
    /// Drivers see only their own membership; the staff roles see the
    /// roster.
    pub fn can_list_members(self) -> bool {
        self >= Self::Dispatcher
    }
}

impl std::str::FromStr for HubRole {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRIVER" => Ok(Self::Driver),
            "DISPATCHER" => Ok(Self::Dispatcher),
            "MANAGER" => Ok(Self::Manager),
            "OWNER" => Ok(Self::Owner),
            other => Err(UnknownEnumValue::new("hub role", other)),
        }
    }
}

/// An organisational grouping of workers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hub {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional city for search.
    pub city: Option<String>,
    /// User who created the hub.
    pub created_by: Uuid,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One user's membership of one hub. A user belongs to at most one hub.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HubMembership {
    /// Primary key.
    pub id: Uuid,
    /// The hub.
    pub hub_id: Uuid,
    /// The member.
    pub user_id: Uuid,
    /// Membership role.
    pub role: HubRole,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

/// Roster entry: a membership joined with the member's public profile.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HubMember {
    /// The membership row.
    #[serde(flatten)]
    pub membership: HubMembership,
    /// Member display name.
    pub display_name: String,
    /// Member email.
    pub email: String,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HubRole::Driver, false)]
    #[case(HubRole::Dispatcher, true)]
    #[case(HubRole::Manager, true)]
    #[case(HubRole::Owner, true)]
    fn member_listing_is_role_gated(#[case] role: HubRole, #[case] allowed: bool) {
        assert_eq!(role.can_list_members(), allowed);
    }

    #[rstest]
    #[case(HubRole::Driver, "DRIVER")]
    #[case(HubRole::Dispatcher, "DISPATCHER")]
    #[case(HubRole::Manager, "MANAGER")]
    #[case(HubRole::Owner, "OWNER")]
    fn role_round_trips(#[case] role: HubRole, #[case] text: &str) {
        assert_eq!(role.as_str(), text);
        assert_eq!(text.parse::<HubRole>().expect("parses"), role);
    }
}
