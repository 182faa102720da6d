//! Port for route and stop persistence.
//!
//! Adapters implementing this port own the transaction boundaries: every
//! mutation that touches a child row and a route counter must commit
//! both or neither, deriving counter deltas from the transition planning
//! functions in [`crate::domain::route`] applied to state read under the
//! route-row lock.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::route::{
    CounterPolicy, Route, RouteDetail, RouteStatus, Stop, StopStatus,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by route repository adapters.
    pub enum RouteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "route repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "route repository query failed: {message}",
    }
}

/// Insert payload for a new route.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoute {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Optional platform link association (ownership checked by the
    /// service before this call).
    pub platform_link_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Day the route is driven.
    pub route_date: NaiveDate,
}

/// Listing filter for route queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteFilter {
    /// Restrict to routes on this day.
    pub on: Option<NaiveDate>,
    /// Restrict to routes in this state.
    pub status: Option<RouteStatus>,
}

/// Insert payload for one stop.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStop {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Street address.
    pub address: String,
    /// Optional short label.
    pub label: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Explicit position; when `None` the adapter assigns
    /// `max(existing) + 1` inside the insert transaction.
    pub sequence: Option<i32>,
}

/// A requested stop status change plus everything the adapter needs to
/// apply it atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct StopStatusChange {
    /// Target status.
    pub status: StopStatus,
    /// Notes to overwrite, when provided.
    pub notes: Option<String>,
    /// Timestamp for any first-entry stamps.
    pub now: DateTime<Utc>,
    /// Counter policy to plan with.
    pub policy: CounterPolicy,
}

/// A requested route status change.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStatusChange {
    /// Target status.
    pub status: RouteStatus,
    /// Timestamp for any first-entry stamps.
    pub now: DateTime<Utc>,
}

/// Result of a stop transition: the stop and the route whose counters
/// were updated in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTransition {
    /// The stop after the write.
    pub stop: Stop,
    /// The route after the counter update.
    pub route: Route,
}

/// Port for route and stop reads and transactional mutations.
///
/// Every method scopes its queries to `user_id`; a route that exists but
/// belongs to someone else is indistinguishable from a missing one
/// (`None`), so ownership is re-checked on every call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// Insert a route with `ASSIGNED` status and zero counters.
    async fn insert(&self, route: NewRoute) -> Result<Route, RouteRepositoryError>;

    /// List routes of one user, newest date first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: RouteFilter,
    ) -> Result<Vec<Route>, RouteRepositoryError>;

    /// One route of one user.
    async fn find_for_user(
        &self,
        user_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<Route>, RouteRepositoryError>;

    /// One route with stops (sequence-ordered) and packages.
    async fn find_detail(
        &self,
        user_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<RouteDetail>, RouteRepositoryError>;

    /// Apply a route status change with stamp-once timestamps.
    async fn apply_route_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        change: RouteStatusChange,
    ) -> Result<Option<Route>, RouteRepositoryError>;

    /// Append stops in one transaction.
    ///
    /// Missing sequences are assigned contiguously from the current
    /// maximum; `total_stops` is incremented by the batch size in the
    /// same transaction. Returns `None` when the route is not the
    /// caller's.
    async fn add_stops(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stops: Vec<NewStop>,
    ) -> Result<Option<Vec<Stop>>, RouteRepositoryError>;

    /// One stop of one route of one user.
    async fn find_stop(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stop_id: Uuid,
    ) -> Result<Option<Stop>, RouteRepositoryError>;

    /// Apply a stop status change and its counter delta atomically.
    async fn apply_stop_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stop_id: Uuid,
        change: StopStatusChange,
    ) -> Result<Option<StopTransition>, RouteRepositoryError>;
}
