//! Route tracking service: routes, stops, packages, and their progress
//! counters.
//!
//! The service validates ownership and shapes, then delegates each
//! mutation to a repository method that owns the transaction. Counter
//! arithmetic never happens here; it is planned by
//! [`crate::domain::route`] and applied by the adapters under the route
//! row lock.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::error::Error;
use super::ports::{
    NewPackage, NewRoute, NewStop, PackageRepository, PackageRepositoryError, PackageStatusChange,
    PackageTransition, PlatformLinkRepository, PlatformLinkRepositoryError, RouteFilter,
    RouteRepository, RouteRepositoryError, RouteStatusChange, StopStatusChange, StopTransition,
};
use super::route::{
    CounterPolicy, DEFAULT_COUNTER_POLICY, Package, PackageStatus, Route, RouteDetail,
    RouteStatus, Stop, StopStatus,
};

const MAX_ROUTE_NAME_LEN: usize = 120;
const MAX_BULK_STOPS: usize = 200;

/// Validated payload for route creation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDraft {
    /// Display name.
    pub name: String,
    /// Day the route is driven; defaults to today when omitted.
    pub route_date: Option<NaiveDate>,
    /// Optional platform link association.
    pub platform_link_id: Option<Uuid>,
}

/// Validation errors for [`RouteDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteDraftValidationError {
    /// The name is empty.
    #[error("route name must not be empty")]
    EmptyName,
    /// The name exceeds the maximum length.
    #[error("route name must be at most {MAX_ROUTE_NAME_LEN} characters")]
    NameTooLong,
}

impl RouteDraft {
    /// Validate raw request parts.
    pub fn try_from_parts(
        name: &str,
        route_date: Option<NaiveDate>,
        platform_link_id: Option<Uuid>,
    ) -> Result<Self, RouteDraftValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RouteDraftValidationError::EmptyName);
        }
        if name.chars().count() > MAX_ROUTE_NAME_LEN {
            return Err(RouteDraftValidationError::NameTooLong);
        }
        Ok(Self {
            name: name.to_owned(),
            route_date,
            platform_link_id,
        })
    }
}

/// Validated payload for one stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopDraft {
    /// Street address.
    pub address: String,
    /// Optional short label.
    pub label: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Explicit position; appended after the current maximum when
    /// omitted.
    pub sequence: Option<i32>,
}

/// Validation errors for [`StopDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StopDraftValidationError {
    /// The address is empty.
    #[error("stop address must not be empty")]
    EmptyAddress,
    /// An explicit sequence below one.
    #[error("stop sequence must be positive")]
    NonPositiveSequence,
}

impl StopDraft {
    /// Validate raw request parts.
    pub fn try_from_parts(
        address: &str,
        label: Option<String>,
        notes: Option<String>,
        sequence: Option<i32>,
    ) -> Result<Self, StopDraftValidationError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(StopDraftValidationError::EmptyAddress);
        }
        if sequence.is_some_and(|s| s < 1) {
            return Err(StopDraftValidationError::NonPositiveSequence);
        }
        Ok(Self {
            address: address.to_owned(),
            label,
            notes,
            sequence,
        })
    }
}

/// Validated payload for one package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDraft {
    /// Carrier tracking number.
    pub tracking_number: String,
    /// Scan lookup key.
    pub barcode: Option<String>,
    /// Stop the parcel is expected at.
    pub stop_id: Option<Uuid>,
}

/// Validation errors for [`PackageDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackageDraftValidationError {
    /// The tracking number is empty.
    #[error("tracking number must not be empty")]
    EmptyTrackingNumber,
    /// A barcode was supplied but is empty.
    #[error("barcode must not be empty when supplied")]
    EmptyBarcode,
}

impl PackageDraft {
    /// Validate raw request parts.
    pub fn try_from_parts(
        tracking_number: &str,
        barcode: Option<String>,
        stop_id: Option<Uuid>,
    ) -> Result<Self, PackageDraftValidationError> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(PackageDraftValidationError::EmptyTrackingNumber);
        }
        let barcode = match barcode {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(PackageDraftValidationError::EmptyBarcode);
                }
                Some(trimmed.to_owned())
            }
            None => None,
        };
        Ok(Self {
            tracking_number: tracking_number.to_owned(),
            barcode,
            stop_id,
        })
    }
}

fn map_route_repo_error(error: RouteRepositoryError) -> Error {
    match error {
        RouteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("route repository unavailable: {message}"))
        }
        RouteRepositoryError::Query { message } => {
            Error::internal(format!("route repository error: {message}"))
        }
    }
}

fn map_package_repo_error(error: PackageRepositoryError) -> Error {
    match error {
        PackageRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("package repository unavailable: {message}"))
        }
        PackageRepositoryError::Query { message } => {
            Error::internal(format!("package repository error: {message}"))
        }
        PackageRepositoryError::DuplicateBarcode => {
            Error::conflict("barcode is already attached to this route")
        }
    }
}

fn map_link_repo_error(error: PlatformLinkRepositoryError) -> Error {
    match error {
        PlatformLinkRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("platform link repository unavailable: {message}"))
        }
        PlatformLinkRepositoryError::Query { message } => {
            Error::internal(format!("platform link repository error: {message}"))
        }
        PlatformLinkRepositoryError::DuplicateLink => {
            Error::conflict("platform is already linked")
        }
    }
}

fn route_not_found() -> Error {
    Error::not_found("route not found")
}

/// Route tracking service.
#[derive(Clone)]
pub struct RouteService {
    routes: Arc<dyn RouteRepository>,
    packages: Arc<dyn PackageRepository>,
    links: Arc<dyn PlatformLinkRepository>,
    policy: CounterPolicy,
}

impl RouteService {
    /// Create the service with the shipped counter policy.
    pub fn new(
        routes: Arc<dyn RouteRepository>,
        packages: Arc<dyn PackageRepository>,
        links: Arc<dyn PlatformLinkRepository>,
    ) -> Self {
        Self::with_policy(routes, packages, links, DEFAULT_COUNTER_POLICY)
    }

    /// Create the service with an explicit counter policy.
    pub fn with_policy(
        routes: Arc<dyn RouteRepository>,
        packages: Arc<dyn PackageRepository>,
        links: Arc<dyn PlatformLinkRepository>,
        policy: CounterPolicy,
    ) -> Self {
        Self {
            routes,
            packages,
            links,
            policy,
        }
    }

    /// Create a route in `ASSIGNED` state with zero counters.
    ///
    /// A supplied platform link must be an active link of the caller.
    pub async fn create_route(
        &self,
        user_id: Uuid,
        draft: RouteDraft,
        today: NaiveDate,
    ) -> Result<Route, Error> {
        if let Some(link_id) = draft.platform_link_id {
            self.links
                .find_for_user(user_id, link_id)
                .await
                .map_err(map_link_repo_error)?
                .ok_or_else(|| Error::not_found("platform link not found"))?;
        }

        self.routes
            .insert(NewRoute {
                id: Uuid::new_v4(),
                user_id,
                platform_link_id: draft.platform_link_id,
                name: draft.name,
                route_date: draft.route_date.unwrap_or(today),
            })
            .await
            .map_err(map_route_repo_error)
    }

    /// List the caller's routes, optionally filtered.
    pub async fn list_routes(
        &self,
        user_id: Uuid,
        filter: RouteFilter,
    ) -> Result<Vec<Route>, Error> {
        self.routes
            .list_for_user(user_id, filter)
            .await
            .map_err(map_route_repo_error)
    }

    /// One route with stops and packages.
    pub async fn route_detail(
        &self,
        user_id: Uuid,
        route_id: Uuid,
    ) -> Result<RouteDetail, Error> {
        self.routes
            .find_detail(user_id, route_id)
            .await
            .map_err(map_route_repo_error)?
            .ok_or_else(route_not_found)
    }

    /// Set the route status, stamping `started_at`/`completed_at` on
    /// first entry only.
    pub async fn update_route_status(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        status: RouteStatus,
        now: DateTime<Utc>,
    ) -> Result<Route, Error> {
        self.routes
            .apply_route_transition(user_id, route_id, RouteStatusChange { status, now })
            .await
            .map_err(map_route_repo_error)?
            .ok_or_else(route_not_found)
    }

    /// Append one stop.
    pub async fn add_stop(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        draft: StopDraft,
    ) -> Result<Stop, Error> {
        let mut stops = self.add_stops_internal(user_id, route_id, vec![draft]).await?;
        stops
            .pop()
            .ok_or_else(|| Error::internal("stop insert returned no rows"))
    }

    /// Append a batch of stops in one transaction with contiguous
    /// sequences.
    pub async fn bulk_add_stops(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        drafts: Vec<StopDraft>,
    ) -> Result<Vec<Stop>, Error> {
        if drafts.is_empty() {
            return Err(Error::invalid_request("stops must not be empty"));
        }
        if drafts.len() > MAX_BULK_STOPS {
            return Err(Error::invalid_request(format!(
                "at most {MAX_BULK_STOPS} stops per request"
            )));
        }
        self.add_stops_internal(user_id, route_id, drafts).await
    }

    async fn add_stops_internal(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        drafts: Vec<StopDraft>,
    ) -> Result<Vec<Stop>, Error> {
        let stops = drafts
            .into_iter()
            .map(|draft| NewStop {
                id: Uuid::new_v4(),
                address: draft.address,
                label: draft.label,
                notes: draft.notes,
                sequence: draft.sequence,
            })
            .collect();

        self.routes
            .add_stops(user_id, route_id, stops)
            .await
            .map_err(map_route_repo_error)?
            .ok_or_else(route_not_found)
    }

    /// Set a stop's status; counters and timestamps follow the
    /// transition plan inside the repository transaction.
    pub async fn update_stop_status(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stop_id: Uuid,
        status: StopStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<StopTransition, Error> {
        self.routes
            .apply_stop_transition(
                user_id,
                route_id,
                stop_id,
                StopStatusChange {
                    status,
                    notes,
                    now,
                    policy: self.policy,
                },
            )
            .await
            .map_err(map_route_repo_error)?
            .ok_or_else(|| Error::not_found("stop not found"))
    }

    /// Add a package to a route, already scanned in.
    pub async fn add_package(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        draft: PackageDraft,
        now: DateTime<Utc>,
    ) -> Result<Package, Error> {
        if let Some(stop_id) = draft.stop_id {
            self.routes
                .find_stop(user_id, route_id, stop_id)
                .await
                .map_err(map_route_repo_error)?
                .ok_or_else(|| Error::not_found("stop not found on this route"))?;
        }

        self.packages
            .insert(
                user_id,
                route_id,
                NewPackage {
                    id: Uuid::new_v4(),
                    stop_id: draft.stop_id,
                    tracking_number: draft.tracking_number,
                    barcode: draft.barcode,
                    scanned_at: now,
                },
            )
            .await
            .map_err(map_package_repo_error)?
            .ok_or_else(route_not_found)
    }

    /// Advance the package carrying this barcode one scan step.
    pub async fn scan_package(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        barcode: &str,
        now: DateTime<Utc>,
    ) -> Result<PackageTransition, Error> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(Error::invalid_request("barcode must not be empty"));
        }

        self.packages
            .apply_scan(user_id, route_id, barcode, now, self.policy)
            .await
            .map_err(map_package_repo_error)?
            .ok_or_else(|| Error::not_found("no package with this barcode on this route"))
    }

    /// Explicitly set a package status.
    pub async fn update_package_status(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        package_id: Uuid,
        status: PackageStatus,
        notes: Option<String>,
        recipient_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PackageTransition, Error> {
        self.packages
            .apply_package_transition(
                user_id,
                route_id,
                package_id,
                PackageStatusChange {
                    status,
                    notes,
                    recipient_name,
                    now,
                    policy: self.policy,
                },
            )
            .await
            .map_err(map_package_repo_error)?
            .ok_or_else(|| Error::not_found("package not found"))
    }

    /// Packages on one of the caller's routes.
    pub async fn list_packages(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        status: Option<PackageStatus>,
    ) -> Result<Vec<Package>, Error> {
        self.routes
            .find_for_user(user_id, route_id)
            .await
            .map_err(map_route_repo_error)?
            .ok_or_else(route_not_found)?;

        self.packages
            .list_for_route(user_id, route_id, status)
            .await
            .map_err(map_package_repo_error)
    }
}
