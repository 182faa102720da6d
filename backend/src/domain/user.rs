//! User identity, roles, and the validated email address type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role. Hub creation promotes a `Worker` to `HubAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Ordinary delivery worker.
    Worker,
    /// Administrator of a hub.
    HubAdmin,
    /// Platform operator.
    SuperAdmin,
}

impl UserRole {
    /// Stable string form used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "WORKER",
            Self::HubAdmin => "HUB_ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WORKER" => Ok(Self::Worker),
            "HUB_ADMIN" => Ok(Self::HubAdmin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            other => Err(UnknownEnumValue::new("user role", other)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a persisted enum string has no domain counterpart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownEnumValue {
    kind: &'static str,
    value: String,
}

impl UnknownEnumValue {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Lower-cased, shape-checked email address.
///
/// ## Invariants
/// - Non-empty local part and dotted domain separated by exactly one `@`.
/// - Stored lower-case so uniqueness checks are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "worker@example.com")]
pub struct Email(String);

/// Validation errors for [`Email`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailValidationError {
    /// The address is empty or whitespace.
    #[error("email must not be empty")]
    Empty,
    /// The address does not look like `local@domain`.
    #[error("email must contain a local part and a domain")]
    Malformed,
}

impl Email {
    /// Parse and normalise an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmailValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmailValidationError::Empty);
        }
        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(EmailValidationError::Malformed);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// The normalised address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = EmailValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    pub id: Uuid,
    /// Normalised email address, unique across accounts.
    pub email: Email,
    /// Human-readable display name.
    pub display_name: String,
    /// Account role.
    pub role: UserRole,
    /// Premium flag; upgrades happen out of band.
    pub is_premium: bool,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}
