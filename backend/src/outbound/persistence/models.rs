//! Internal Diesel row structs and their domain conversions.
//!
//! These types are implementation details of the persistence layer and
//! must never be exposed to the domain. They exist to satisfy Diesel's
//! type requirements for queries and mutations; the `TryFrom` impls at
//! the bottom translate rows into domain entities, failing when a stored
//! enum string has drifted from the code.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::hub::{Hub, HubMembership};
use crate::domain::platform::{DeliveryPlatform, PlatformLink};
use crate::domain::earnings::EarningRecord;
use crate::domain::ports::Session;
use crate::domain::route::{Package, Route, Stop};
use crate::domain::shift::Shift;
use crate::domain::user::{EmailValidationError, UnknownEnumValue, User};

use super::schema::{
    delivery_platforms, earning_records, hub_memberships, hubs, packages, platform_links, routes,
    sessions, shifts, stops, users,
};

/// Conversion failures from stored rows to domain entities.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RowConversionError {
    /// A status or role column holds a value the code does not know.
    #[error(transparent)]
    Enum(#[from] UnknownEnumValue),
    /// The stored email no longer passes validation.
    #[error("stored email is invalid: {0}")]
    Email(#[from] EmailValidationError),
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub is_premium: bool,
}

impl TryFrom<UserRow> for User {
    type Error = RowConversionError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: crate::domain::user::Email::new(&row.email)?,
            display_name: row.display_name,
            role: row.role.parse()?,
            is_premium: row.is_premium,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Row struct for reading from the sessions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for recording issued tokens.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
pub(crate) struct NewSessionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: &'a str,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery platforms
// ---------------------------------------------------------------------------

/// Row struct for reading from the delivery_platforms table. The catalog
/// is seeded out of band, so there is no insertable counterpart.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = delivery_platforms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeliveryPlatformRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub deep_link_url: Option<String>,
    pub web_portal_url: Option<String>,
    pub package_id_hint: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeliveryPlatformRow> for DeliveryPlatform {
    fn from(row: DeliveryPlatformRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            deep_link_url: row.deep_link_url,
            web_portal_url: row.web_portal_url,
            package_id_hint: row.package_id_hint,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Platform links
// ---------------------------------------------------------------------------

/// Row struct for reading from the platform_links table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = platform_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PlatformLinkRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform_id: Uuid,
    pub display_name: Option<String>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new platform links.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = platform_links)]
pub(crate) struct NewPlatformLinkRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform_id: Uuid,
    pub display_name: Option<&'a str>,
    pub is_active: bool,
}

impl From<PlatformLinkRow> for PlatformLink {
    fn from(row: PlatformLinkRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            platform_id: row.platform_id,
            display_name: row.display_name,
            last_accessed_at: row.last_accessed_at,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Row struct for reading from the routes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RouteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform_link_id: Option<Uuid>,
    pub name: String,
    pub route_date: NaiveDate,
    pub status: String,
    pub total_stops: i32,
    pub completed_stops: i32,
    pub total_packages: i32,
    pub delivered_packages: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new route records. Counters start at
/// zero explicitly rather than leaning on column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routes)]
pub(crate) struct NewRouteRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform_link_id: Option<Uuid>,
    pub name: &'a str,
    pub route_date: NaiveDate,
    pub status: &'a str,
    pub total_stops: i32,
    pub completed_stops: i32,
    pub total_packages: i32,
    pub delivered_packages: i32,
}

/// Changeset for route status transitions. `None` fields are left
/// untouched, which is what makes the stamp-once timestamps work.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = routes)]
pub(crate) struct RouteTransitionUpdate<'a> {
    pub status: &'a str,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RouteRow> for Route {
    type Error = RowConversionError;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            platform_link_id: row.platform_link_id,
            name: row.name,
            route_date: row.route_date,
            status: row.status.parse()?,
            total_stops: row.total_stops,
            completed_stops: row.completed_stops,
            total_packages: row.total_packages,
            delivered_packages: row.delivered_packages,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Stops
// ---------------------------------------------------------------------------

/// Row struct for reading from the stops table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = stops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StopRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub sequence: i32,
    pub address: String,
    pub label: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub arrived_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending stops. Owned strings because batches
/// are built in a loop.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = stops)]
pub(crate) struct NewStopRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub sequence: i32,
    pub address: String,
    pub label: Option<String>,
    pub notes: Option<String>,
    pub status: &'static str,
}

/// Changeset for stop status transitions.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = stops)]
pub(crate) struct StopTransitionUpdate<'a> {
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<StopRow> for Stop {
    type Error = RowConversionError;

    fn try_from(row: StopRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            route_id: row.route_id,
            sequence: row.sequence,
            address: row.address,
            label: row.label,
            notes: row.notes,
            status: row.status.parse()?,
            arrived_at: row.arrived_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

/// Row struct for reading from the packages table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PackageRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub stop_id: Option<Uuid>,
    pub tracking_number: String,
    pub barcode: Option<String>,
    pub status: String,
    pub recipient_name: Option<String>,
    pub notes: Option<String>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new package records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = packages)]
pub(crate) struct NewPackageRow<'a> {
    pub id: Uuid,
    pub route_id: Uuid,
    pub stop_id: Option<Uuid>,
    pub tracking_number: &'a str,
    pub barcode: Option<&'a str>,
    pub status: &'a str,
    pub scanned_at: Option<DateTime<Utc>>,
}

/// Changeset for package status transitions.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = packages)]
pub(crate) struct PackageTransitionUpdate<'a> {
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub recipient_name: Option<&'a str>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<PackageRow> for Package {
    type Error = RowConversionError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            route_id: row.route_id,
            stop_id: row.stop_id,
            tracking_number: row.tracking_number,
            barcode: row.barcode,
            status: row.status.parse()?,
            recipient_name: row.recipient_name,
            notes: row.notes,
            scanned_at: row.scanned_at,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Earnings
// ---------------------------------------------------------------------------

/// Row struct for reading from the earning_records table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = earning_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EarningRecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform_link_id: Option<Uuid>,
    pub amount_cents: i64,
    pub tips_cents: i64,
    pub currency: String,
    pub earned_on: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending ledger entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = earning_records)]
pub(crate) struct NewEarningRecordRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform_link_id: Option<Uuid>,
    pub amount_cents: i64,
    pub tips_cents: i64,
    pub currency: &'a str,
    pub earned_on: NaiveDate,
    pub note: Option<&'a str>,
}

impl From<EarningRecordRow> for EarningRecord {
    fn from(row: EarningRecordRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            platform_link_id: row.platform_link_id,
            amount_cents: row.amount_cents,
            tips_cents: row.tips_cents,
            currency: row.currency,
            earned_on: row.earned_on,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Shifts
// ---------------------------------------------------------------------------

/// Row struct for reading from the shifts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shifts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShiftRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for clock-ins.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shifts)]
pub(crate) struct NewShiftRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: &'a str,
    pub started_at: DateTime<Utc>,
}

/// Changeset for shift status transitions.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = shifts)]
pub(crate) struct ShiftTransitionUpdate<'a> {
    pub status: &'a str,
    pub ended_at: Option<DateTime<Utc>>,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = RowConversionError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status.parse()?,
            started_at: row.started_at,
            ended_at: row.ended_at,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Hubs
// ---------------------------------------------------------------------------

/// Row struct for reading from the hubs table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = hubs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HubRow {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating hubs.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = hubs)]
pub(crate) struct NewHubRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub city: Option<&'a str>,
    pub created_by: Uuid,
}

impl From<HubRow> for Hub {
    fn from(row: HubRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            city: row.city,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Row struct for reading from the hub_memberships table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = hub_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HubMembershipRow {
    pub id: Uuid,
    pub hub_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// Insertable struct for creating memberships.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = hub_memberships)]
pub(crate) struct NewHubMembershipRow<'a> {
    pub id: Uuid,
    pub hub_id: Uuid,
    pub user_id: Uuid,
    pub role: &'a str,
}

impl TryFrom<HubMembershipRow> for HubMembership {
    type Error = RowConversionError;

    fn try_from(row: HubMembershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            hub_id: row.hub_id,
            user_id: row.user_id,
            role: row.role.parse()?,
            joined_at: row.joined_at,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn sample_route_row(status: &str) -> RouteRow {
        RouteRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            platform_link_id: None,
            name: "Morning Run".to_owned(),
            route_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
            status: status.to_owned(),
            total_stops: 3,
            completed_stops: 1,
            total_packages: 2,
            delivered_packages: 0,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    fn route_row_converts() {
        let route = Route::try_from(sample_route_row("IN_PROGRESS")).expect("converts");
        assert_eq!(route.status, crate::domain::RouteStatus::InProgress);
        assert_eq!(route.total_stops, 3);
    }

    #[rstest]
    fn route_row_with_drifted_status_fails() {
        let err = Route::try_from(sample_route_row("PAUSED")).expect_err("unknown status");
        assert!(err.to_string().contains("PAUSED"));
    }

    #[rstest]
    fn user_row_with_invalid_email_fails() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "not-an-email".to_owned(),
            password_hash: "$2b$12$hash".to_owned(),
            display_name: "Sam".to_owned(),
            role: "WORKER".to_owned(),
            is_premium: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(User::try_from(row).is_err());
    }
}
