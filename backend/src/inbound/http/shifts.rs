//! Shift timer endpoints.

use actix_web::{get, patch, post, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, Shift, ShiftStatus};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::ApiResult;

/// Query parameters for `GET /api/shifts`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ShiftListQuery {
    /// Restrict to shifts started on this day.
    pub date: Option<NaiveDate>,
}

/// Request body for `PATCH /api/shifts/{id}`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShiftRequest {
    /// Target status, `COMPLETED` or `CANCELLED`.
    pub status: ShiftStatus,
}

/// Shifts of the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/shifts",
    params(ShiftListQuery),
    responses(
        (status = 200, description = "Shifts", body = [Shift]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["shifts"],
    operation_id = "listShifts",
    security(("bearer_token" = []))
)]
#[get("/shifts")]
pub async fn list_shifts(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<ShiftListQuery>,
) -> ApiResult<web::Json<Vec<Shift>>> {
    let shifts = state.shifts.list_shifts(user.user_id(), query.date).await?;
    Ok(web::Json(shifts))
}

/// Clock in.
#[utoipa::path(
    post,
    path = "/api/shifts",
    responses(
        (status = 201, description = "Shift started", body = Shift),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "A shift is already active", body = Error)
    ),
    tags = ["shifts"],
    operation_id = "startShift",
    security(("bearer_token" = []))
)]
#[post("/shifts")]
pub async fn start_shift(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let shift = state.shifts.start_shift(user.user_id(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(shift))
}

/// End or cancel a shift.
#[utoipa::path(
    patch,
    path = "/api/shifts/{id}",
    params(("id" = Uuid, Path, description = "Shift id")),
    request_body = UpdateShiftRequest,
    responses(
        (status = 200, description = "Shift updated", body = Shift),
        (status = 400, description = "Invalid target status", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Shift not found", body = Error)
    ),
    tags = ["shifts"],
    operation_id = "updateShift",
    security(("bearer_token" = []))
)]
#[patch("/shifts/{id}")]
pub async fn update_shift(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    shift_id: web::Path<Uuid>,
    payload: web::Json<UpdateShiftRequest>,
) -> ApiResult<web::Json<Shift>> {
    let shift = state
        .shifts
        .update_shift(user.user_id(), *shift_id, payload.status, Utc::now())
        .await?;
    Ok(web::Json(shift))
}
