//! Port for package persistence and barcode scanning.
//!
//! Shares the transactional contract of
//! [`crate::domain::ports::RouteRepository`]: child write and route
//! counter move together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::route::{CounterPolicy, Package, PackageStatus, Route};

use super::define_port_error;

define_port_error! {
    /// Errors raised by package repository adapters.
    pub enum PackageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "package repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "package repository query failed: {message}",
        /// The barcode is already attached to a package on this route.
        DuplicateBarcode => "barcode is already attached to this route",
    }
}

/// Insert payload for a new package.
///
/// Packages are created already `SCANNED_IN` (the worker is holding the
/// parcel when they add it), so the scan timestamp comes with the
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPackage {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Stop the parcel is expected at (validated by the service).
    pub stop_id: Option<Uuid>,
    /// Carrier tracking number.
    pub tracking_number: String,
    /// Scan lookup key, unique within the route when present.
    pub barcode: Option<String>,
    /// Stamp for `scanned_at`.
    pub scanned_at: DateTime<Utc>,
}

/// A requested package status change plus everything the adapter needs
/// to apply it atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageStatusChange {
    /// Target status.
    pub status: PackageStatus,
    /// Notes to overwrite, when provided.
    pub notes: Option<String>,
    /// Recipient to record, when provided.
    pub recipient_name: Option<String>,
    /// Timestamp for any first-entry stamps.
    pub now: DateTime<Utc>,
    /// Counter policy to plan with.
    pub policy: CounterPolicy,
}

/// Result of a package transition: the package and the route whose
/// counters were updated in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageTransition {
    /// The package after the write.
    pub package: Package,
    /// The route after the counter update.
    pub route: Route,
}

/// Port for package reads and transactional mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Insert a package and bump `total_packages` in one transaction.
    ///
    /// Returns `None` when the route is not the caller's.
    async fn insert(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        package: NewPackage,
    ) -> Result<Option<Package>, PackageRepositoryError>;

    /// Packages of one route, optionally filtered by status.
    ///
    /// The service checks route ownership before calling.
    async fn list_for_route(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        status: Option<PackageStatus>,
    ) -> Result<Vec<Package>, PackageRepositoryError>;

    /// Advance the package identified by (route, barcode) one scan step.
    ///
    /// The adapter reads the current status under lock, derives the next
    /// status via [`PackageStatus::next_scan_status`], and applies the
    /// transition plan. Returns `None` when no package on the caller's
    /// route carries the barcode.
    async fn apply_scan(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        barcode: &str,
        now: DateTime<Utc>,
        policy: CounterPolicy,
    ) -> Result<Option<PackageTransition>, PackageRepositoryError>;

    /// Apply an explicit package status change atomically.
    async fn apply_package_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        package_id: Uuid,
        change: PackageStatusChange,
    ) -> Result<Option<PackageTransition>, PackageRepositoryError>;
}
