//! Earnings ledger endpoints.

use actix_web::{get, post, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    EarningDraft, EarningDraftValidationError, EarningRecord, EarningsSummary, Error,
};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /api/earnings`.
///
/// Money arrives as decimal strings ("12.50") and is stored as integer
/// cents; floats never enter the pipeline.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordEarningRequest {
    /// Base pay as a decimal string.
    #[schema(example = "42.50")]
    pub amount: String,
    /// Tips as a decimal string; defaults to zero.
    #[schema(example = "6.00")]
    pub tips: Option<String>,
    /// ISO 4217 currency code; defaults to USD.
    pub currency: Option<String>,
    /// Attribution to one of the caller's platform links.
    pub platform_link_id: Option<Uuid>,
    /// Day the money was earned; defaults to today.
    pub earned_on: Option<NaiveDate>,
    /// Free-form note.
    pub note: Option<String>,
}

impl TryFrom<RecordEarningRequest> for EarningDraft {
    type Error = EarningDraftValidationError;

    fn try_from(value: RecordEarningRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(
            &value.amount,
            value.tips.as_deref(),
            value.currency.as_deref(),
            value.platform_link_id,
            value.earned_on,
            value.note,
        )
    }
}

/// Query parameters for `GET /api/earnings`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct EarningsListQuery {
    /// Earliest day to include.
    pub from: Option<NaiveDate>,
    /// Latest day to include.
    pub to: Option<NaiveDate>,
}

fn map_earning_draft_error(err: EarningDraftValidationError) -> Error {
    let field = match err {
        EarningDraftValidationError::InvalidAmount => "amount",
        EarningDraftValidationError::InvalidTips => "tips",
        EarningDraftValidationError::InvalidCurrency => "currency",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Entries of the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/earnings",
    params(EarningsListQuery),
    responses(
        (status = 200, description = "Earning records", body = [EarningRecord]),
        (status = 400, description = "Inverted date range", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["earnings"],
    operation_id = "listEarnings",
    security(("bearer_token" = []))
)]
#[get("/earnings")]
pub async fn list_earnings(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<EarningsListQuery>,
) -> ApiResult<web::Json<Vec<EarningRecord>>> {
    let records = state
        .earnings
        .list_earnings(user.user_id(), query.from, query.to)
        .await?;
    Ok(web::Json(records))
}

/// Append one ledger entry.
#[utoipa::path(
    post,
    path = "/api/earnings",
    request_body = RecordEarningRequest,
    responses(
        (status = 201, description = "Record created", body = EarningRecord),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Platform link not found", body = Error)
    ),
    tags = ["earnings"],
    operation_id = "recordEarning",
    security(("bearer_token" = []))
)]
#[post("/earnings")]
pub async fn record_earning(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<RecordEarningRequest>,
) -> ApiResult<HttpResponse> {
    let draft = EarningDraft::try_from(payload.into_inner()).map_err(map_earning_draft_error)?;
    let record = state
        .earnings
        .record_earning(user.user_id(), draft, Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Today / week / month / all-time aggregates.
#[utoipa::path(
    get,
    path = "/api/earnings/summary",
    responses(
        (status = 200, description = "Summary", body = EarningsSummary),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["earnings"],
    operation_id = "earningsSummary",
    security(("bearer_token" = []))
)]
#[get("/earnings/summary")]
pub async fn earnings_summary(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<EarningsSummary>> {
    let summary = state
        .earnings
        .summary(user.user_id(), Utc::now().date_naive())
        .await?;
    Ok(web::Json(summary))
}
