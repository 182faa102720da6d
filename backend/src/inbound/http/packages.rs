//! Package endpoints, including the barcode scan flow.

use actix_web::{get, patch, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::PackageTransition;
use crate::domain::{
    Error, Package, PackageDraft, PackageDraftValidationError, PackageStatus, Route,
};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /api/routes/{id}/packages`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPackageRequest {
    /// Carrier tracking number.
    pub tracking_number: String,
    /// Scan lookup key, unique within the route.
    pub barcode: Option<String>,
    /// Stop the parcel is expected at.
    pub stop_id: Option<Uuid>,
}

impl TryFrom<AddPackageRequest> for PackageDraft {
    type Error = PackageDraftValidationError;

    fn try_from(value: AddPackageRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.tracking_number, value.barcode, value.stop_id)
    }
}

/// Request body for `POST /api/routes/{id}/packages/scan`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanPackageRequest {
    /// Barcode read by the scanner.
    pub barcode: String,
}

/// Request body for `PATCH /api/routes/{id}/packages/{packageId}`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackageStatusRequest {
    /// Target status.
    pub status: PackageStatus,
    /// Notes to overwrite, when provided.
    pub notes: Option<String>,
    /// Recipient to record, when provided.
    pub recipient_name: Option<String>,
}

/// Query parameters for `GET /api/routes/{id}/packages`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PackageListQuery {
    /// Restrict to packages in this state.
    pub status: Option<PackageStatus>,
}

/// Response for package transitions: the package plus the route whose
/// counters moved with it.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageTransitionResponse {
    /// The package after the write.
    pub package: Package,
    /// The route after the counter update.
    pub route: Route,
}

impl From<PackageTransition> for PackageTransitionResponse {
    fn from(transition: PackageTransition) -> Self {
        Self {
            package: transition.package,
            route: transition.route,
        }
    }
}

fn map_package_draft_error(err: PackageDraftValidationError) -> Error {
    let field = match err {
        PackageDraftValidationError::EmptyTrackingNumber => "trackingNumber",
        PackageDraftValidationError::EmptyBarcode => "barcode",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Add a package to a route.
#[utoipa::path(
    post,
    path = "/api/routes/{id}/packages",
    params(("id" = Uuid, Path, description = "Route id")),
    request_body = AddPackageRequest,
    responses(
        (status = 201, description = "Package created", body = Package),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Route or stop not found", body = Error),
        (status = 409, description = "Barcode already on this route", body = Error)
    ),
    tags = ["packages"],
    operation_id = "addPackage",
    security(("bearer_token" = []))
)]
#[post("/routes/{id}/packages")]
pub async fn add_package(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    route_id: web::Path<Uuid>,
    payload: web::Json<AddPackageRequest>,
) -> ApiResult<HttpResponse> {
    let draft = PackageDraft::try_from(payload.into_inner()).map_err(map_package_draft_error)?;
    let package = state
        .routes
        .add_package(user.user_id(), *route_id, draft, Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(package))
}

/// Advance the package carrying this barcode one scan step.
#[utoipa::path(
    post,
    path = "/api/routes/{id}/packages/scan",
    params(("id" = Uuid, Path, description = "Route id")),
    request_body = ScanPackageRequest,
    responses(
        (status = 200, description = "Package advanced", body = PackageTransitionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No package with this barcode", body = Error)
    ),
    tags = ["packages"],
    operation_id = "scanPackage",
    security(("bearer_token" = []))
)]
#[post("/routes/{id}/packages/scan")]
pub async fn scan_package(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    route_id: web::Path<Uuid>,
    payload: web::Json<ScanPackageRequest>,
) -> ApiResult<web::Json<PackageTransitionResponse>> {
    let transition = state
        .routes
        .scan_package(user.user_id(), *route_id, &payload.barcode, Utc::now())
        .await?;
    Ok(web::Json(transition.into()))
}

/// Explicitly set a package status.
#[utoipa::path(
    patch,
    path = "/api/routes/{id}/packages/{packageId}",
    params(
        ("id" = Uuid, Path, description = "Route id"),
        ("packageId" = Uuid, Path, description = "Package id")
    ),
    request_body = UpdatePackageStatusRequest,
    responses(
        (status = 200, description = "Package updated", body = PackageTransitionResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Package not found", body = Error)
    ),
    tags = ["packages"],
    operation_id = "updatePackageStatus",
    security(("bearer_token" = []))
)]
#[patch("/routes/{id}/packages/{package_id}")]
pub async fn update_package_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    payload: web::Json<UpdatePackageStatusRequest>,
) -> ApiResult<web::Json<PackageTransitionResponse>> {
    let (route_id, package_id) = path.into_inner();
    let payload = payload.into_inner();
    let transition = state
        .routes
        .update_package_status(
            user.user_id(),
            route_id,
            package_id,
            payload.status,
            payload.notes,
            payload.recipient_name,
            Utc::now(),
        )
        .await?;
    Ok(web::Json(transition.into()))
}

/// Packages on one of the caller's routes.
#[utoipa::path(
    get,
    path = "/api/routes/{id}/packages",
    params(
        ("id" = Uuid, Path, description = "Route id"),
        PackageListQuery
    ),
    responses(
        (status = 200, description = "Packages", body = [Package]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Route not found", body = Error)
    ),
    tags = ["packages"],
    operation_id = "listPackages",
    security(("bearer_token" = []))
)]
#[get("/routes/{id}/packages")]
pub async fn list_packages(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    route_id: web::Path<Uuid>,
    query: web::Query<PackageListQuery>,
) -> ApiResult<web::Json<Vec<Package>>> {
    let packages = state
        .routes
        .list_packages(user.user_id(), *route_id, query.status)
        .await?;
    Ok(web::Json(packages))
}
