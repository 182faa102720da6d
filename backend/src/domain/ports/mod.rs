//! Driven-side ports: the traits persistence and security adapters
//! implement, one file per port.

mod macros;

pub mod earnings_repository;
pub mod hub_repository;
pub mod notification_repository;
pub mod package_repository;
pub mod password_hasher;
pub mod platform_link_repository;
pub mod platform_repository;
pub mod route_repository;
pub mod session_repository;
pub mod shift_repository;
pub mod token_codec;
pub mod user_repository;

pub(crate) use macros::define_port_error;

pub use earnings_repository::{
    EarningsRepository, EarningsRepositoryError, EarningsWindows, NewEarningRecord,
};
pub use hub_repository::{HubRepository, HubRepositoryError, NewHub, NewHubMembership};
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
pub use package_repository::{
    NewPackage, PackageRepository, PackageRepositoryError, PackageStatusChange, PackageTransition,
};
pub use password_hasher::{PasswordHasher, PasswordHasherError};
pub use platform_link_repository::{
    NewPlatformLink, PlatformLinkRepository, PlatformLinkRepositoryError,
};
pub use platform_repository::{PlatformRepository, PlatformRepositoryError};
pub use route_repository::{
    NewRoute, NewStop, RouteFilter, RouteRepository, RouteRepositoryError, RouteStatusChange,
    StopStatusChange, StopTransition,
};
pub use session_repository::{NewSession, Session, SessionRepository, SessionRepositoryError};
pub use shift_repository::{NewShift, ShiftRepository, ShiftRepositoryError, ShiftStatusChange};
pub use token_codec::{AccessClaims, TokenCodec, TokenCodecError};
pub use user_repository::{NewUser, StoredUser, UserRepository, UserRepositoryError};

#[cfg(test)]
pub use earnings_repository::MockEarningsRepository;
#[cfg(test)]
pub use hub_repository::MockHubRepository;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
#[cfg(test)]
pub use package_repository::MockPackageRepository;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
#[cfg(test)]
pub use platform_link_repository::MockPlatformLinkRepository;
#[cfg(test)]
pub use platform_repository::MockPlatformRepository;
#[cfg(test)]
pub use route_repository::MockRouteRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;
#[cfg(test)]
pub use shift_repository::MockShiftRepository;
#[cfg(test)]
pub use token_codec::MockTokenCodec;
#[cfg(test)]
pub use user_repository::MockUserRepository;
