//! Server construction and wiring.
//!
//! Builds the connection pool, the repository adapters, the domain
//! services, and the Actix application serving them. Repositories and
//! services are plain values cloned into each worker's app instance;
//! there is no process-wide singleton beyond the shared pool handle.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use backend::domain::{
    AuthService, DashboardService, EarningsService, HubService, PlatformService, RouteService,
    ShiftService,
};
#[cfg(debug_assertions)]
use backend::ApiDoc;
use backend::inbound::http::health::{live, ready, HealthState};
use backend::inbound::http::{configure_api, HttpState};
use backend::outbound::persistence::{
    DbPool, DieselEarningsRepository, DieselHubRepository, DieselNotificationRepository,
    DieselPackageRepository, DieselPlatformLinkRepository, DieselPlatformRepository,
    DieselRouteRepository, DieselSessionRepository, DieselShiftRepository, DieselUserRepository,
    PoolConfig,
};
use backend::outbound::security::{BcryptPasswordHasher, JwtTokenCodec};
use backend::Trace;

/// Wire the domain services to database-backed adapters.
fn build_http_state(pool: &DbPool, token_secret: &[u8]) -> HttpState {
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let sessions = Arc::new(DieselSessionRepository::new(pool.clone()));
    let platforms = Arc::new(DieselPlatformRepository::new(pool.clone()));
    let links = Arc::new(DieselPlatformLinkRepository::new(pool.clone()));
    let route_repo = Arc::new(DieselRouteRepository::new(pool.clone()));
    let package_repo = Arc::new(DieselPackageRepository::new(pool.clone()));
    let earnings_repo = Arc::new(DieselEarningsRepository::new(pool.clone()));
    let shifts_repo = Arc::new(DieselShiftRepository::new(pool.clone()));
    let hubs_repo = Arc::new(DieselHubRepository::new(pool.clone()));
    let notifications = Arc::new(DieselNotificationRepository::new(pool.clone()));

    let hasher = Arc::new(BcryptPasswordHasher::new());
    let tokens = Arc::new(JwtTokenCodec::new(token_secret));

    HttpState {
        auth: AuthService::new(users.clone(), sessions, hasher, tokens.clone()),
        platforms: PlatformService::new(platforms.clone()),
        dashboard: DashboardService::new(
            links.clone(),
            platforms,
            shifts_repo.clone(),
            earnings_repo.clone(),
            notifications,
        ),
        routes: RouteService::new(route_repo, package_repo, links.clone()),
        earnings: EarningsService::new(earnings_repo, links),
        shifts: ShiftService::new(shifts_repo),
        hubs: HubService::new(hubs_repo),
        tokens,
    }
}

/// Build the pool, wire the state, and serve until shutdown.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let mut pool_config = PoolConfig::new(&config.database_url);
    if let Some(max_size) = config.pool_max_size {
        pool_config = pool_config.with_max_size(max_size);
    }
    let pool = DbPool::new(pool_config)
        .await
        .map_err(|err| std::io::Error::other(format!("database pool: {err}")))?;

    let state = web::Data::new(build_http_state(&pool, &config.token_secret));
    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(state.clone())
            .app_data(server_health_state.clone())
            .wrap(Trace)
            .configure(configure_api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app = app.service(
            SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );

        #[cfg(feature = "metrics")]
        let app = app.wrap(make_metrics());

        app
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    server.run().await
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    PrometheusMetricsBuilder::new("courier_backend")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
