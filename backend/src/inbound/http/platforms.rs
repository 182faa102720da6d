//! Catalog endpoints for delivery platforms.
//!
//! The catalog is readable with or without a token; the optional
//! extractor mirrors the mobile client, which shows the catalog on the
//! onboarding screen before login.

use actix_web::{get, web};
use serde::Deserialize;

use crate::domain::{DeliveryPlatform, Error};

use super::auth::MaybeAuthenticated;
use super::state::HttpState;
use super::ApiResult;

/// Query parameters for `GET /api/platforms/search`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PlatformSearchQuery {
    /// Name fragment to match, case-insensitively.
    pub q: String,
}

/// Active catalog rows.
#[utoipa::path(
    get,
    path = "/api/platforms",
    responses(
        (status = 200, description = "Active platforms", body = [DeliveryPlatform])
    ),
    tags = ["platforms"],
    operation_id = "listPlatforms",
    security([])
)]
#[get("/platforms")]
pub async fn list_platforms(
    state: web::Data<HttpState>,
    _user: MaybeAuthenticated,
) -> ApiResult<web::Json<Vec<DeliveryPlatform>>> {
    Ok(web::Json(state.platforms.list_platforms().await?))
}

/// Search active catalog rows by name.
#[utoipa::path(
    get,
    path = "/api/platforms/search",
    params(PlatformSearchQuery),
    responses(
        (status = 200, description = "Matching platforms", body = [DeliveryPlatform]),
        (status = 400, description = "Empty query", body = Error)
    ),
    tags = ["platforms"],
    operation_id = "searchPlatforms",
    security([])
)]
#[get("/platforms/search")]
pub async fn search_platforms(
    state: web::Data<HttpState>,
    _user: MaybeAuthenticated,
    query: web::Query<PlatformSearchQuery>,
) -> ApiResult<web::Json<Vec<DeliveryPlatform>>> {
    Ok(web::Json(state.platforms.search_platforms(&query.q).await?))
}

/// One active catalog row by slug.
#[utoipa::path(
    get,
    path = "/api/platforms/{slug}",
    params(("slug" = String, Path, description = "Catalog slug")),
    responses(
        (status = 200, description = "Platform", body = DeliveryPlatform),
        (status = 404, description = "Unknown or retired platform", body = Error)
    ),
    tags = ["platforms"],
    operation_id = "platformBySlug",
    security([])
)]
#[get("/platforms/{slug}")]
pub async fn platform_by_slug(
    state: web::Data<HttpState>,
    _user: MaybeAuthenticated,
    slug: web::Path<String>,
) -> ApiResult<web::Json<DeliveryPlatform>> {
    Ok(web::Json(state.platforms.platform_by_slug(&slug).await?))
}
