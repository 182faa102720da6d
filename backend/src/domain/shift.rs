//! Shift timer entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UnknownEnumValue;

/// Shift lifecycle states, mirroring the stop pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    /// Clocked in.
    Active,
    /// Clocked out normally.
    Completed,
    /// Discarded without counting.
    Cancelled,
}

impl ShiftStatus {
    /// Stable string form used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownEnumValue::new("shift status", other)),
        }
    }
}

/// One clock-in/clock-out interval.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// Primary key.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Lifecycle state.
    pub status: ShiftStatus,
    /// Clock-in time.
    pub started_at: DateTime<Utc>,
    /// First transition out of `ACTIVE`; never overwritten afterwards.
    pub ended_at: Option<DateTime<Utc>>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ShiftStatus::Active, "ACTIVE")]
    #[case(ShiftStatus::Completed, "COMPLETED")]
    #[case(ShiftStatus::Cancelled, "CANCELLED")]
    fn status_round_trips(#[case] status: ShiftStatus, #[case] text: &str) {
        assert_eq!(status.as_str(), text);
        assert_eq!(text.parse::<ShiftStatus>().expect("parses"), status);
    }
}
