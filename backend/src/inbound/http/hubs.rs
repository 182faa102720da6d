//! Hub membership endpoints.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    Error, Hub, HubDraft, HubDraftValidationError, HubMember, HubMembership, HubWithMembership,
};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /api/hubs`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHubRequest {
    /// Display name.
    pub name: String,
    /// Optional city.
    pub city: Option<String>,
}

impl TryFrom<CreateHubRequest> for HubDraft {
    type Error = HubDraftValidationError;

    fn try_from(value: CreateHubRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.name, value.city)
    }
}

/// Query parameters for `GET /api/hubs`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct HubSearchQuery {
    /// Name or city fragment; empty lists every hub.
    pub q: Option<String>,
}

fn map_hub_draft_error(err: HubDraftValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": "name" }))
}

/// Hubs, optionally narrowed by a query fragment.
#[utoipa::path(
    get,
    path = "/api/hubs",
    params(HubSearchQuery),
    responses(
        (status = 200, description = "Hubs", body = [Hub]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["hubs"],
    operation_id = "listHubs",
    security(("bearer_token" = []))
)]
#[get("/hubs")]
pub async fn list_hubs(
    state: web::Data<HttpState>,
    _user: AuthenticatedUser,
    query: web::Query<HubSearchQuery>,
) -> ApiResult<web::Json<Vec<Hub>>> {
    let hubs = state.hubs.search_hubs(query.q.as_deref().unwrap_or("")).await?;
    Ok(web::Json(hubs))
}

/// Query parameters for `GET /api/hubs/search`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RequiredHubSearchQuery {
    /// Name or city fragment to match.
    pub q: String,
}

/// Hub search, the screen-facing sibling of the plain listing.
#[utoipa::path(
    get,
    path = "/api/hubs/search",
    params(RequiredHubSearchQuery),
    responses(
        (status = 200, description = "Matching hubs", body = [Hub]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["hubs"],
    operation_id = "searchHubs",
    security(("bearer_token" = []))
)]
#[get("/hubs/search")]
pub async fn search_hubs(
    state: web::Data<HttpState>,
    _user: AuthenticatedUser,
    query: web::Query<RequiredHubSearchQuery>,
) -> ApiResult<web::Json<Vec<Hub>>> {
    let hubs = state.hubs.search_hubs(&query.q).await?;
    Ok(web::Json(hubs))
}

/// Create a hub with the caller as owner.
#[utoipa::path(
    post,
    path = "/api/hubs",
    request_body = CreateHubRequest,
    responses(
        (status = 201, description = "Hub created", body = HubWithMembership),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Caller already belongs to a hub", body = Error)
    ),
    tags = ["hubs"],
    operation_id = "createHub",
    security(("bearer_token" = []))
)]
#[post("/hubs")]
pub async fn create_hub(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateHubRequest>,
) -> ApiResult<HttpResponse> {
    let draft = HubDraft::try_from(payload.into_inner()).map_err(map_hub_draft_error)?;
    let created = state.hubs.create_hub(user.user_id(), draft).await?;
    Ok(HttpResponse::Created().json(created))
}

/// The caller's hub and membership.
#[utoipa::path(
    get,
    path = "/api/hubs/my",
    responses(
        (status = 200, description = "Membership", body = HubWithMembership),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No membership", body = Error)
    ),
    tags = ["hubs"],
    operation_id = "myHub",
    security(("bearer_token" = []))
)]
#[get("/hubs/my")]
pub async fn my_hub(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<HubWithMembership>> {
    Ok(web::Json(state.hubs.my_hub(user.user_id()).await?))
}

/// Join a hub as a driver.
#[utoipa::path(
    post,
    path = "/api/hubs/{hubId}/join",
    params(("hubId" = Uuid, Path, description = "Hub id")),
    responses(
        (status = 201, description = "Joined", body = HubMembership),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown hub", body = Error),
        (status = 409, description = "Caller already belongs to a hub", body = Error)
    ),
    tags = ["hubs"],
    operation_id = "joinHub",
    security(("bearer_token" = []))
)]
#[post("/hubs/{hub_id}/join")]
pub async fn join_hub(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    hub_id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let membership = state.hubs.join_hub(user.user_id(), *hub_id).await?;
    Ok(HttpResponse::Created().json(membership))
}

/// Roster of a hub; staff roles only.
#[utoipa::path(
    get,
    path = "/api/hubs/{hubId}/members",
    params(("hubId" = Uuid, Path, description = "Hub id")),
    responses(
        (status = 200, description = "Members", body = [HubMember]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not staff of this hub", body = Error)
    ),
    tags = ["hubs"],
    operation_id = "listHubMembers",
    security(("bearer_token" = []))
)]
#[get("/hubs/{hub_id}/members")]
pub async fn list_hub_members(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    hub_id: web::Path<Uuid>,
) -> ApiResult<web::Json<Vec<HubMember>>> {
    let members = state.hubs.list_members(user.user_id(), *hub_id).await?;
    Ok(web::Json(members))
}
