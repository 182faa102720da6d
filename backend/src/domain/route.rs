//! Routes, stops, and packages: entities, status machines, and the
//! transition planning that keeps route progress counters in lockstep with
//! child rows.
//!
//! The planning functions here are pure. Persistence adapters call them
//! inside the transaction that writes the child row, so the counter delta
//! is always derived from the previous status actually read under the
//! route-row lock, never from a stale snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UnknownEnumValue;

/// Route lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    /// Created and waiting for the worker to start.
    Assigned,
    /// The worker is driving the route.
    InProgress,
    /// All work the worker intends to do is done.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl RouteStatus {
    /// Stable string form used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for RouteStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSIGNED" => Ok(Self::Assigned),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownEnumValue::new("route status", other)),
        }
    }
}

/// Stop lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopStatus {
    /// Not yet visited.
    Pending,
    /// The worker is at the address.
    Arrived,
    /// Delivered or otherwise finished.
    Completed,
    /// Deliberately skipped.
    Skipped,
    /// Attempted but the delivery could not be made.
    Attempted,
}

impl StopStatus {
    /// Stable string form used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Arrived => "ARRIVED",
            Self::Completed => "COMPLETED",
            Self::Skipped => "SKIPPED",
            Self::Attempted => "ATTEMPTED",
        }
    }
}

impl std::str::FromStr for StopStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ARRIVED" => Ok(Self::Arrived),
            "COMPLETED" => Ok(Self::Completed),
            "SKIPPED" => Ok(Self::Skipped),
            "ATTEMPTED" => Ok(Self::Attempted),
            other => Err(UnknownEnumValue::new("stop status", other)),
        }
    }
}

/// Package lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
    /// Known but not yet scanned into the route.
    Pending,
    /// Scanned into the worker's possession.
    ScannedIn,
    /// Loaded and moving.
    OutForDelivery,
    /// Handed over.
    Delivered,
    /// Sent back to the depot.
    Returned,
    /// Damaged in transit.
    Damaged,
}

impl PackageStatus {
    /// Stable string form used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::ScannedIn => "SCANNED_IN",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Returned => "RETURNED",
            Self::Damaged => "DAMAGED",
        }
    }

    /// Next state for a barcode scan.
    ///
    /// Scanning walks the happy path one step per call and leaves every
    /// other state untouched, so re-scanning a delivered (or returned,
    /// or damaged) package is a no-op.
    pub fn next_scan_status(self) -> Self {
        match self {
            Self::Pending => Self::ScannedIn,
            Self::ScannedIn => Self::OutForDelivery,
            Self::OutForDelivery => Self::Delivered,
            other => other,
        }
    }
}

impl std::str::FromStr for PackageStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SCANNED_IN" => Ok(Self::ScannedIn),
            "OUT_FOR_DELIVERY" => Ok(Self::OutForDelivery),
            "DELIVERED" => Ok(Self::Delivered),
            "RETURNED" => Ok(Self::Returned),
            "DAMAGED" => Ok(Self::Damaged),
            other => Err(UnknownEnumValue::new("package status", other)),
        }
    }
}

/// How progress counters react when a child leaves its terminal state.
///
/// The shipped behaviour is [`CounterPolicy::CountOnce`]: a stop moved back
/// out of `COMPLETED` keeps its tally, because the counters record work
/// performed rather than work currently in the terminal state. The
/// alternative is expressed here so the choice is a visible policy rather
/// than an implicit branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterPolicy {
    /// Increment on first entry into the terminal state, never decrement.
    CountOnce,
    /// Mirror the live child state: decrement when leaving the terminal
    /// state.
    CountLive,
}

/// Policy compiled into the services.
pub const DEFAULT_COUNTER_POLICY: CounterPolicy = CounterPolicy::CountOnce;

/// The progress-relevant slice of a stop row, as read inside the
/// transaction that will update it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopProgress {
    /// Status before the transition.
    pub status: StopStatus,
    /// Whether `arrived_at` is already set.
    pub has_arrived_at: bool,
    /// Whether `completed_at` is already set.
    pub has_completed_at: bool,
}

/// Writes a stop transition implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTransitionPlan {
    /// Set `arrived_at = now` (first entry into `ARRIVED` only).
    pub set_arrived_at: bool,
    /// Set `completed_at = now` (first entry into `COMPLETED` only).
    pub set_completed_at: bool,
    /// Delta to apply to `routes.completed_stops`.
    pub completed_delta: i32,
}

/// Plan the writes for a stop status change.
///
/// Timestamps are set exactly once: re-posting the same status, or
/// revisiting a state whose timestamp is already stamped, never resets it.
/// The counter delta compares previous and next status, so posting
/// `COMPLETED` twice increments once.
pub fn plan_stop_transition(
    current: StopProgress,
    next: StopStatus,
    policy: CounterPolicy,
) -> StopTransitionPlan {
    let entering_completed =
        current.status != StopStatus::Completed && next == StopStatus::Completed;
    let leaving_completed = current.status == StopStatus::Completed && next != StopStatus::Completed;

    let completed_delta = match policy {
        CounterPolicy::CountOnce => i32::from(entering_completed),
        CounterPolicy::CountLive => i32::from(entering_completed) - i32::from(leaving_completed),
    };

    StopTransitionPlan {
        set_arrived_at: next == StopStatus::Arrived && !current.has_arrived_at,
        set_completed_at: next == StopStatus::Completed && !current.has_completed_at,
        completed_delta,
    }
}

/// The progress-relevant slice of a package row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageProgress {
    /// Status before the transition.
    pub status: PackageStatus,
    /// Whether `scanned_at` is already set.
    pub has_scanned_at: bool,
    /// Whether `delivered_at` is already set.
    pub has_delivered_at: bool,
}

/// Writes a package transition implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageTransitionPlan {
    /// Set `scanned_at = now` (first entry into `SCANNED_IN` only).
    pub set_scanned_at: bool,
    /// Set `delivered_at = now` (first entry into `DELIVERED` only).
    pub set_delivered_at: bool,
    /// Delta to apply to `routes.delivered_packages`.
    pub delivered_delta: i32,
}

/// Plan the writes for a package status change.
///
/// Shares the stop rules: stamp-once timestamps and an increment derived
/// from the previous-vs-next comparison, so setting `DELIVERED` on an
/// already delivered package changes nothing.
pub fn plan_package_transition(
    current: PackageProgress,
    next: PackageStatus,
    policy: CounterPolicy,
) -> PackageTransitionPlan {
    let entering_delivered =
        current.status != PackageStatus::Delivered && next == PackageStatus::Delivered;
    let leaving_delivered =
        current.status == PackageStatus::Delivered && next != PackageStatus::Delivered;

    let delivered_delta = match policy {
        CounterPolicy::CountOnce => i32::from(entering_delivered),
        CounterPolicy::CountLive => i32::from(entering_delivered) - i32::from(leaving_delivered),
    };

    PackageTransitionPlan {
        set_scanned_at: next == PackageStatus::ScannedIn && !current.has_scanned_at,
        set_delivered_at: next == PackageStatus::Delivered && !current.has_delivered_at,
        delivered_delta,
    }
}

/// The progress-relevant slice of a route row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteProgress {
    /// Status before the transition.
    pub status: RouteStatus,
    /// Whether `started_at` is already set.
    pub has_started_at: bool,
    /// Whether `completed_at` is already set.
    pub has_completed_at: bool,
}

/// Writes a route transition implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTransitionPlan {
    /// Set `started_at = now` (first entry into `IN_PROGRESS` only).
    pub set_started_at: bool,
    /// Set `completed_at = now` (first entry into `COMPLETED` only).
    pub set_completed_at: bool,
}

/// Plan the writes for a route status change.
///
/// There is deliberately no check that the route's stops are complete
/// before allowing `COMPLETED`; that is the caller's call.
pub fn plan_route_transition(current: RouteProgress, next: RouteStatus) -> RouteTransitionPlan {
    RouteTransitionPlan {
        set_started_at: next == RouteStatus::InProgress && !current.has_started_at,
        set_completed_at: next == RouteStatus::Completed && !current.has_completed_at,
    }
}

/// A delivery route owned by one worker.
///
/// The four counters are denormalized aggregates over the route's stops
/// and packages, maintained transactionally by the persistence adapters.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Primary key.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Optional association with one of the owner's platform links.
    pub platform_link_id: Option<Uuid>,
    /// Display name, e.g. "Morning Run".
    pub name: String,
    /// Day the route is driven.
    pub route_date: NaiveDate,
    /// Lifecycle state.
    pub status: RouteStatus,
    /// Count of stops attached to the route.
    pub total_stops: i32,
    /// Stops counted into `COMPLETED` (one-way, see [`CounterPolicy`]).
    pub completed_stops: i32,
    /// Count of packages attached to the route.
    pub total_packages: i32,
    /// Packages counted into `DELIVERED` (one-way, see [`CounterPolicy`]).
    pub delivered_packages: i32,
    /// First entry into `IN_PROGRESS`.
    pub started_at: Option<DateTime<Utc>>,
    /// First entry into `COMPLETED`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One physical delivery location on a route.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    /// Primary key.
    pub id: Uuid,
    /// Owning route.
    pub route_id: Uuid,
    /// Position within the route, 1-based and unique per route.
    pub sequence: i32,
    /// Street address.
    pub address: String,
    /// Optional short label ("Flat 3, rear entrance").
    pub label: Option<String>,
    /// Free-form worker notes.
    pub notes: Option<String>,
    /// Lifecycle state.
    pub status: StopStatus,
    /// First entry into `ARRIVED`.
    pub arrived_at: Option<DateTime<Utc>>,
    /// First entry into `COMPLETED`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One trackable parcel on a route, optionally pinned to a stop.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Primary key.
    pub id: Uuid,
    /// Owning route.
    pub route_id: Uuid,
    /// Stop the parcel is expected at, when known.
    pub stop_id: Option<Uuid>,
    /// Carrier tracking number.
    pub tracking_number: String,
    /// Scan lookup key, unique within the route when present.
    pub barcode: Option<String>,
    /// Lifecycle state.
    pub status: PackageStatus,
    /// Who signed for the parcel.
    pub recipient_name: Option<String>,
    /// Free-form worker notes.
    pub notes: Option<String>,
    /// First entry into `SCANNED_IN`.
    pub scanned_at: Option<DateTime<Utc>>,
    /// First entry into `DELIVERED`.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A route with its children, as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetail {
    /// The route row.
    #[serde(flatten)]
    pub route: Route,
    /// Stops ordered by `sequence`.
    pub stops: Vec<Stop>,
    /// Packages in creation order.
    pub packages: Vec<Package>,
}
