//! Inbound HTTP adapter: handlers, bearer auth extraction, error
//! mapping, and shared state.

pub mod auth;
pub mod dashboard;
pub mod earnings;
pub mod error;
pub mod health;
pub mod hubs;
pub mod packages;
pub mod platforms;
pub mod routes;
pub mod shifts;
pub mod state;
pub mod users;

pub use error::ApiResult;
pub use state::HttpState;

use actix_web::web;

/// Mount every `/api` endpoint.
///
/// Shared between the server binary and integration tests so both serve
/// exactly the same route table. Expects an [`HttpState`] in app data.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(users::register)
            .service(users::login)
            .service(users::current_user)
            .service(users::logout)
            .service(platforms::list_platforms)
            .service(platforms::search_platforms)
            .service(platforms::platform_by_slug)
            .service(dashboard::dashboard)
            .service(dashboard::link_platform)
            .service(dashboard::unlink_platform)
            .service(dashboard::launch_platform)
            .service(routes::list_routes)
            .service(routes::create_route)
            .service(routes::route_detail)
            .service(routes::update_route_status)
            .service(routes::add_stop)
            .service(routes::bulk_add_stops)
            .service(routes::update_stop_status)
            .service(packages::add_package)
            .service(packages::scan_package)
            .service(packages::update_package_status)
            .service(packages::list_packages)
            .service(earnings::list_earnings)
            .service(earnings::record_earning)
            .service(earnings::earnings_summary)
            .service(shifts::list_shifts)
            .service(shifts::start_shift)
            .service(shifts::update_shift)
            .service(hubs::list_hubs)
            .service(hubs::search_hubs)
            .service(hubs::create_hub)
            .service(hubs::my_hub)
            .service(hubs::join_hub)
            .service(hubs::list_hub_members),
    );
}
