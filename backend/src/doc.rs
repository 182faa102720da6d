//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification
//! for the REST API: every HTTP endpoint from the inbound layer, the
//! schemas they reference, and the bearer token security scheme. The
//! generated specification backs Swagger UI in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain;
use crate::inbound::http;

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /api/auth/register or /api/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Courier backend API",
        description = "HTTP interface for the delivery-worker mobile application."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("bearer_token" = [])),
    paths(
        http::users::register,
        http::users::login,
        http::users::current_user,
        http::users::logout,
        http::platforms::list_platforms,
        http::platforms::search_platforms,
        http::platforms::platform_by_slug,
        http::dashboard::dashboard,
        http::dashboard::link_platform,
        http::dashboard::unlink_platform,
        http::dashboard::launch_platform,
        http::routes::list_routes,
        http::routes::create_route,
        http::routes::route_detail,
        http::routes::update_route_status,
        http::routes::add_stop,
        http::routes::bulk_add_stops,
        http::routes::update_stop_status,
        http::packages::add_package,
        http::packages::scan_package,
        http::packages::update_package_status,
        http::packages::list_packages,
        http::earnings::list_earnings,
        http::earnings::record_earning,
        http::earnings::earnings_summary,
        http::shifts::list_shifts,
        http::shifts::start_shift,
        http::shifts::update_shift,
        http::hubs::list_hubs,
        http::hubs::search_hubs,
        http::hubs::create_hub,
        http::hubs::my_hub,
        http::hubs::join_hub,
        http::hubs::list_hub_members,
        http::health::ready,
        http::health::live,
    ),
    components(schemas(
        domain::Error,
        domain::ErrorCode,
        domain::User,
        domain::Email,
        domain::UserRole,
        domain::AuthenticatedSession,
        domain::DeliveryPlatform,
        domain::PlatformLink,
        domain::PlatformLinkView,
        domain::DashboardView,
        domain::WeekEarnings,
        domain::Route,
        domain::RouteDetail,
        domain::RouteStatus,
        domain::Stop,
        domain::StopStatus,
        domain::Package,
        domain::PackageStatus,
        domain::EarningRecord,
        domain::EarningsSummary,
        domain::EarningsTotals,
        domain::Shift,
        domain::ShiftStatus,
        domain::Hub,
        domain::HubMembership,
        domain::HubMember,
        domain::HubRole,
        domain::HubWithMembership,
        http::users::RegisterRequest,
        http::users::LoginRequest,
        http::dashboard::LinkPlatformRequest,
        http::routes::CreateRouteRequest,
        http::routes::UpdateRouteStatusRequest,
        http::routes::AddStopRequest,
        http::routes::BulkAddStopsRequest,
        http::routes::UpdateStopStatusRequest,
        http::routes::StopTransitionResponse,
        http::packages::AddPackageRequest,
        http::packages::ScanPackageRequest,
        http::packages::UpdatePackageStatusRequest,
        http::packages::PackageTransitionResponse,
        http::earnings::RecordEarningRequest,
        http::shifts::UpdateShiftRequest,
        http::hubs::CreateHubRequest,
    )),
    tags(
        (name = "auth", description = "Account lifecycle"),
        (name = "platforms", description = "Delivery platform catalog"),
        (name = "dashboard", description = "Aggregate view and platform links"),
        (name = "routes", description = "Route and stop tracking"),
        (name = "packages", description = "Package tracking and scanning"),
        (name = "earnings", description = "Earnings ledger"),
        (name = "shifts", description = "Shift timer"),
        (name = "hubs", description = "Hub membership"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn document_builds_and_references_every_tagged_group() {
        let doc = ApiDoc::openapi();
        let tags: Vec<String> = doc
            .tags
            .iter()
            .flatten()
            .map(|tag| tag.name.clone())
            .collect();
        for expected in [
            "auth", "platforms", "dashboard", "routes", "packages", "earnings", "shifts",
            "hubs", "health",
        ] {
            assert!(tags.iter().any(|t| t == expected), "missing tag {expected}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components present");
        assert!(components.security_schemes.contains_key("bearer_token"));
    }

    #[test]
    fn all_paths_are_mounted_under_api_or_healthz() {
        let doc = ApiDoc::openapi();
        for (path, _) in doc.paths.paths {
            assert!(
                path.starts_with("/api/") || path.starts_with("/healthz/"),
                "unexpected path {path}"
            );
        }
    }
}
