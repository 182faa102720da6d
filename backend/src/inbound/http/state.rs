//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data`, so they depend
//! on domain services (and the token codec for the auth extractor) and
//! remain testable with in-memory adapters behind those services.

use std::sync::Arc;

use crate::domain::ports::TokenCodec;
use crate::domain::{
    AuthService, DashboardService, EarningsService, HubService, PlatformService, RouteService,
    ShiftService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Account lifecycle.
    pub auth: AuthService,
    /// Catalog reads.
    pub platforms: PlatformService,
    /// Dashboard aggregation and platform links.
    pub dashboard: DashboardService,
    /// Route/stop/package tracking.
    pub routes: RouteService,
    /// Earnings ledger.
    pub earnings: EarningsService,
    /// Shift timer.
    pub shifts: ShiftService,
    /// Hub membership.
    pub hubs: HubService,
    /// Token verification for the bearer extractor.
    pub tokens: Arc<dyn TokenCodec>,
}
