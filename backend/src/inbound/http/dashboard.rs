//! Dashboard endpoints: the aggregate view and platform link lifecycle.

use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DashboardView, Error, PlatformLinkView};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /api/dashboard/link`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkPlatformRequest {
    /// Catalog platform to link.
    pub platform_id: Uuid,
    /// Per-user display name override.
    pub display_name: Option<String>,
}

/// The aggregate dashboard view.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard", body = DashboardView),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "dashboard",
    security(("bearer_token" = []))
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<DashboardView>> {
    let view = state
        .dashboard
        .dashboard(user.user_id(), Utc::now().date_naive())
        .await?;
    Ok(web::Json(view))
}

/// Link the caller to a catalog platform.
#[utoipa::path(
    post,
    path = "/api/dashboard/link",
    request_body = LinkPlatformRequest,
    responses(
        (status = 201, description = "Linked", body = PlatformLinkView),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown platform", body = Error),
        (status = 409, description = "Already linked", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "linkPlatform",
    security(("bearer_token" = []))
)]
#[post("/dashboard/link")]
pub async fn link_platform(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<LinkPlatformRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let view = state
        .dashboard
        .link_platform(user.user_id(), payload.platform_id, payload.display_name)
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// Soft-deactivate one of the caller's links.
#[utoipa::path(
    delete,
    path = "/api/dashboard/link/{id}",
    params(("id" = Uuid, Path, description = "Platform link id")),
    responses(
        (status = 204, description = "Unlinked"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown link", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "unlinkPlatform",
    security(("bearer_token" = []))
)]
#[delete("/dashboard/link/{id}")]
pub async fn unlink_platform(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    link_id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .dashboard
        .unlink_platform(user.user_id(), *link_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Stamp `last_accessed_at` and return the launch targets.
#[utoipa::path(
    post,
    path = "/api/dashboard/launch/{id}",
    params(("id" = Uuid, Path, description = "Platform link id")),
    responses(
        (status = 200, description = "Launch targets", body = PlatformLinkView),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown link", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "launchPlatform",
    security(("bearer_token" = []))
)]
#[post("/dashboard/launch/{id}")]
pub async fn launch_platform(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    link_id: web::Path<Uuid>,
) -> ApiResult<web::Json<PlatformLinkView>> {
    let view = state
        .dashboard
        .launch_platform(user.user_id(), *link_id, Utc::now())
        .await?;
    Ok(web::Json(view))
}
