//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and
//!   domain types, and own the transaction boundaries the ports promise.
//!   Business rules stay in the domain; the one thing adapters apply is
//!   the pre-computed transition plans, because those must run against
//!   state read under the route-row lock.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are implementation details, never exposed
//!   to the domain layer.
//! - **Strongly typed errors**: every database failure maps to the port
//!   error enum of the repository it came from.

mod diesel_earnings_repository;
mod diesel_hub_repository;
mod diesel_notification_repository;
mod diesel_package_repository;
mod diesel_platform_link_repository;
mod diesel_platform_repository;
mod diesel_route_repository;
mod diesel_session_repository;
mod diesel_shift_repository;
pub(crate) mod diesel_support;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_earnings_repository::DieselEarningsRepository;
pub use diesel_hub_repository::DieselHubRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_package_repository::DieselPackageRepository;
pub use diesel_platform_link_repository::DieselPlatformLinkRepository;
pub use diesel_platform_repository::DieselPlatformRepository;
pub use diesel_route_repository::DieselRouteRepository;
pub use diesel_session_repository::DieselSessionRepository;
pub use diesel_shift_repository::DieselShiftRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
