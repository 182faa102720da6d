//! Route and stop endpoints.

use actix_web::{get, patch, post, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::{RouteFilter, StopTransition};
use crate::domain::{
    Error, Route, RouteDetail, RouteDraft, RouteDraftValidationError, RouteStatus, Stop,
    StopDraft, StopDraftValidationError, StopStatus,
};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /api/routes`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    /// Display name, e.g. "Morning Run".
    pub name: String,
    /// Day the route is driven; defaults to today.
    pub route_date: Option<NaiveDate>,
    /// Optional platform link association.
    pub platform_link_id: Option<Uuid>,
}

impl TryFrom<CreateRouteRequest> for RouteDraft {
    type Error = RouteDraftValidationError;

    fn try_from(value: CreateRouteRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.name, value.route_date, value.platform_link_id)
    }
}

/// Query parameters for `GET /api/routes`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RouteListQuery {
    /// Restrict to routes on this day.
    pub date: Option<NaiveDate>,
    /// Restrict to routes in this state.
    pub status: Option<RouteStatus>,
}

/// Request body for `PATCH /api/routes/{id}/status`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouteStatusRequest {
    /// Target status.
    pub status: RouteStatus,
}

/// Request body for one stop.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddStopRequest {
    /// Street address.
    pub address: String,
    /// Optional short label.
    pub label: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Explicit position; appended when omitted.
    pub sequence: Option<i32>,
}

impl TryFrom<AddStopRequest> for StopDraft {
    type Error = StopDraftValidationError;

    fn try_from(value: AddStopRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.address, value.label, value.notes, value.sequence)
    }
}

/// Request body for `POST /api/routes/{id}/stops/bulk`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAddStopsRequest {
    /// Stops to append, in order.
    pub stops: Vec<AddStopRequest>,
}

/// Request body for `PATCH /api/routes/{id}/stops/{stopId}`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStopStatusRequest {
    /// Target status.
    pub status: StopStatus,
    /// Notes to overwrite, when provided.
    pub notes: Option<String>,
}

/// Response for stop transitions: the stop plus the route whose
/// counters moved with it.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopTransitionResponse {
    /// The stop after the write.
    pub stop: Stop,
    /// The route after the counter update.
    pub route: Route,
}

impl From<StopTransition> for StopTransitionResponse {
    fn from(transition: StopTransition) -> Self {
        Self {
            stop: transition.stop,
            route: transition.route,
        }
    }
}

fn map_route_draft_error(err: RouteDraftValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": "name" }))
}

fn map_stop_draft_error(index: Option<usize>, err: &StopDraftValidationError) -> Error {
    let field = match err {
        StopDraftValidationError::EmptyAddress => "address",
        StopDraftValidationError::NonPositiveSequence => "sequence",
    };
    let details = match index {
        Some(index) => json!({ "field": field, "index": index }),
        None => json!({ "field": field }),
    };
    Error::invalid_request(err.to_string()).with_details(details)
}

/// List the caller's routes.
#[utoipa::path(
    get,
    path = "/api/routes",
    params(RouteListQuery),
    responses(
        (status = 200, description = "Routes, newest first", body = [Route]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["routes"],
    operation_id = "listRoutes",
    security(("bearer_token" = []))
)]
#[get("/routes")]
pub async fn list_routes(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<RouteListQuery>,
) -> ApiResult<web::Json<Vec<Route>>> {
    let routes = state
        .routes
        .list_routes(
            user.user_id(),
            RouteFilter {
                on: query.date,
                status: query.status,
            },
        )
        .await?;
    Ok(web::Json(routes))
}

/// Create a route.
#[utoipa::path(
    post,
    path = "/api/routes",
    request_body = CreateRouteRequest,
    responses(
        (status = 201, description = "Route created", body = Route),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Platform link not found", body = Error)
    ),
    tags = ["routes"],
    operation_id = "createRoute",
    security(("bearer_token" = []))
)]
#[post("/routes")]
pub async fn create_route(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateRouteRequest>,
) -> ApiResult<HttpResponse> {
    let draft = RouteDraft::try_from(payload.into_inner()).map_err(map_route_draft_error)?;
    let route = state
        .routes
        .create_route(user.user_id(), draft, Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Created().json(route))
}

/// One route with stops and packages.
#[utoipa::path(
    get,
    path = "/api/routes/{id}",
    params(("id" = Uuid, Path, description = "Route id")),
    responses(
        (status = 200, description = "Route detail", body = RouteDetail),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Route not found", body = Error)
    ),
    tags = ["routes"],
    operation_id = "routeDetail",
    security(("bearer_token" = []))
)]
#[get("/routes/{id}")]
pub async fn route_detail(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    route_id: web::Path<Uuid>,
) -> ApiResult<web::Json<RouteDetail>> {
    let detail = state.routes.route_detail(user.user_id(), *route_id).await?;
    Ok(web::Json(detail))
}

/// Set the route status.
#[utoipa::path(
    patch,
    path = "/api/routes/{id}/status",
    params(("id" = Uuid, Path, description = "Route id")),
    request_body = UpdateRouteStatusRequest,
    responses(
        (status = 200, description = "Route updated", body = Route),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Route not found", body = Error)
    ),
    tags = ["routes"],
    operation_id = "updateRouteStatus",
    security(("bearer_token" = []))
)]
#[patch("/routes/{id}/status")]
pub async fn update_route_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    route_id: web::Path<Uuid>,
    payload: web::Json<UpdateRouteStatusRequest>,
) -> ApiResult<web::Json<Route>> {
    let route = state
        .routes
        .update_route_status(user.user_id(), *route_id, payload.status, Utc::now())
        .await?;
    Ok(web::Json(route))
}

/// Append one stop.
#[utoipa::path(
    post,
    path = "/api/routes/{id}/stops",
    params(("id" = Uuid, Path, description = "Route id")),
    request_body = AddStopRequest,
    responses(
        (status = 201, description = "Stop created", body = Stop),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Route not found", body = Error)
    ),
    tags = ["routes"],
    operation_id = "addStop",
    security(("bearer_token" = []))
)]
#[post("/routes/{id}/stops")]
pub async fn add_stop(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    route_id: web::Path<Uuid>,
    payload: web::Json<AddStopRequest>,
) -> ApiResult<HttpResponse> {
    let draft = StopDraft::try_from(payload.into_inner())
        .map_err(|err| map_stop_draft_error(None, &err))?;
    let stop = state.routes.add_stop(user.user_id(), *route_id, draft).await?;
    Ok(HttpResponse::Created().json(stop))
}

/// Append a batch of stops in one transaction.
#[utoipa::path(
    post,
    path = "/api/routes/{id}/stops/bulk",
    params(("id" = Uuid, Path, description = "Route id")),
    request_body = BulkAddStopsRequest,
    responses(
        (status = 201, description = "Stops created", body = [Stop]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Route not found", body = Error)
    ),
    tags = ["routes"],
    operation_id = "bulkAddStops",
    security(("bearer_token" = []))
)]
#[post("/routes/{id}/stops/bulk")]
pub async fn bulk_add_stops(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    route_id: web::Path<Uuid>,
    payload: web::Json<BulkAddStopsRequest>,
) -> ApiResult<HttpResponse> {
    let drafts = payload
        .into_inner()
        .stops
        .into_iter()
        .enumerate()
        .map(|(index, stop)| {
            StopDraft::try_from(stop).map_err(|err| map_stop_draft_error(Some(index), &err))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let stops = state
        .routes
        .bulk_add_stops(user.user_id(), *route_id, drafts)
        .await?;
    Ok(HttpResponse::Created().json(stops))
}

/// Set a stop's status; the route counters move in the same
/// transaction.
#[utoipa::path(
    patch,
    path = "/api/routes/{id}/stops/{stopId}",
    params(
        ("id" = Uuid, Path, description = "Route id"),
        ("stopId" = Uuid, Path, description = "Stop id")
    ),
    request_body = UpdateStopStatusRequest,
    responses(
        (status = 200, description = "Stop updated", body = StopTransitionResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Stop not found", body = Error)
    ),
    tags = ["routes"],
    operation_id = "updateStopStatus",
    security(("bearer_token" = []))
)]
#[patch("/routes/{id}/stops/{stop_id}")]
pub async fn update_stop_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    payload: web::Json<UpdateStopStatusRequest>,
) -> ApiResult<web::Json<StopTransitionResponse>> {
    let (route_id, stop_id) = path.into_inner();
    let payload = payload.into_inner();
    let transition = state
        .routes
        .update_stop_status(
            user.user_id(),
            route_id,
            stop_id,
            payload.status,
            payload.notes,
            Utc::now(),
        )
        .await?;
    Ok(web::Json(transition.into()))
}
