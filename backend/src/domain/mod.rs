//! Core domain: entities, status machines, services, and ports.
//!
//! Everything here is transport agnostic. Inbound adapters map domain
//! errors to HTTP responses; outbound adapters implement the ports.

pub mod auth_service;
pub mod dashboard_service;
pub mod earnings;
pub mod earnings_service;
pub mod error;
pub mod hub;
pub mod hub_service;
pub mod platform;
pub mod platform_service;
pub mod ports;
pub mod route;
pub mod route_service;
pub mod shift;
pub mod shift_service;
pub mod user;

pub use self::auth_service::{
    AuthService, AuthenticatedSession, Credentials, CredentialsValidationError, Registration,
    RegistrationValidationError, TOKEN_TTL_DAYS,
};
pub use self::dashboard_service::{DashboardService, DashboardView, WeekEarnings};
pub use self::earnings::{
    format_money_cents, parse_money_cents, EarningRecord, EarningsSummary, EarningsTotals,
};
pub use self::earnings_service::{EarningDraft, EarningDraftValidationError, EarningsService};
pub use self::error::{Error, ErrorCode};
pub use self::hub::{Hub, HubMember, HubMembership, HubRole};
pub use self::hub_service::{HubDraft, HubDraftValidationError, HubService, HubWithMembership};
pub use self::platform::{
    seed_platforms, DeliveryPlatform, PlatformLink, PlatformLinkView, SeedPlatform,
};
pub use self::platform_service::PlatformService;
pub use self::route::{
    plan_package_transition, plan_route_transition, plan_stop_transition, CounterPolicy,
    Package, PackageProgress, PackageStatus, PackageTransitionPlan, Route, RouteDetail,
    RouteProgress, RouteStatus, RouteTransitionPlan, Stop, StopProgress, StopStatus,
    StopTransitionPlan, DEFAULT_COUNTER_POLICY,
};
pub use self::route_service::{
    PackageDraft, PackageDraftValidationError, RouteDraft, RouteDraftValidationError,
    RouteService, StopDraft, StopDraftValidationError,
};
pub use self::shift::{Shift, ShiftStatus};
pub use self::shift_service::ShiftService;
pub use self::user::{Email, EmailValidationError, UnknownEnumValue, User, UserRole};
