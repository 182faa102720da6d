//! In-memory adapters for tests (feature `test-support`).
//!
//! One shared store implements every repository port with the same
//! observable semantics as the Diesel adapters, including the
//! transition-plan counter arithmetic, so handler and service tests can
//! exercise full flows without a database. Not for production use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    AccessClaims, EarningsRepository, EarningsRepositoryError, EarningsWindows, HubRepository,
    HubRepositoryError, NewEarningRecord, NewHub, NewHubMembership, NewPackage, NewPlatformLink,
    NewRoute, NewSession, NewShift, NewStop, NewUser, NotificationRepository,
    NotificationRepositoryError, PackageRepository, PackageRepositoryError, PackageStatusChange,
    PackageTransition, PasswordHasher, PasswordHasherError, PlatformLinkRepository,
    PlatformLinkRepositoryError, PlatformRepository, PlatformRepositoryError, RouteFilter,
    RouteRepository, RouteRepositoryError, RouteStatusChange, Session, SessionRepository,
    SessionRepositoryError, ShiftRepository, ShiftRepositoryError, ShiftStatusChange,
    StopStatusChange, StopTransition, StoredUser, TokenCodec, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    plan_package_transition, plan_route_transition, plan_stop_transition, AuthService,
    DashboardService, DeliveryPlatform, EarningRecord, EarningsService, EarningsSummary,
    EarningsTotals, Email, Hub, HubMember, HubMembership, HubRole, HubService, Package,
    PackageProgress, PackageStatus, PlatformLink, PlatformLinkView, PlatformService, Route,
    RouteDetail, RouteProgress, RouteService, RouteStatus, Shift, ShiftService, ShiftStatus,
    Stop, StopProgress, StopStatus, User, UserRole,
};
use crate::inbound::http::HttpState;
use crate::outbound::security::JwtTokenCodec;

#[derive(Default)]
struct StoreInner {
    users: Vec<(User, String)>,
    sessions: Vec<Session>,
    platforms: Vec<DeliveryPlatform>,
    links: Vec<PlatformLink>,
    routes: Vec<Route>,
    stops: Vec<Stop>,
    packages: Vec<Package>,
    earnings: Vec<EarningRecord>,
    shifts: Vec<Shift>,
    hubs: Vec<Hub>,
    memberships: Vec<HubMembership>,
    unread: HashMap<Uuid, i64>,
}

/// Shared in-memory store implementing every repository port.
#[derive(Default)]
pub struct InMemoryRepositories {
    inner: Mutex<StoreInner>,
}

impl InMemoryRepositories {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("store lock poisoned")
    }

    /// Seed one active catalog platform and return it.
    pub fn seed_platform(&self, name: &str, slug: &str) -> DeliveryPlatform {
        let platform = DeliveryPlatform {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            slug: slug.to_owned(),
            deep_link_url: Some(format!("{slug}://")),
            web_portal_url: Some(format!("https://{slug}.example.com")),
            package_id_hint: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.lock().platforms.push(platform.clone());
        platform
    }

    /// Set the unread notification count for a user.
    pub fn set_unread_notifications(&self, user_id: Uuid, count: i64) {
        self.lock().unread.insert(user_id, count);
    }

    /// Direct read of a route row, for invariant assertions in tests.
    pub fn route_snapshot(&self, route_id: Uuid) -> Option<Route> {
        self.lock().routes.iter().find(|r| r.id == route_id).cloned()
    }

    /// Count of live sessions for a user, for logout assertions.
    pub fn session_count(&self, user_id: Uuid) -> usize {
        self.lock()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepositories {
    async fn insert(&self, new_user: NewUser) -> Result<User, UserRepositoryError> {
        let mut inner = self.lock();
        if inner
            .users
            .iter()
            .any(|(user, _)| user.email == new_user.email)
        {
            return Err(UserRepositoryError::duplicate_email());
        }
        let now = Utc::now();
        let user = User {
            id: new_user.id,
            email: new_user.email,
            display_name: new_user.display_name,
            role: new_user.role,
            is_premium: false,
            created_at: now,
            updated_at: now,
        };
        inner.users.push((user.clone(), new_user.password_hash));
        Ok(user)
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredUser>, UserRepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(user, _)| &user.email == email)
            .map(|(user, hash)| StoredUser {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.clone()))
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepositories {
    async fn insert(&self, session: NewSession) -> Result<Session, SessionRepositoryError> {
        let session = Session {
            id: session.id,
            user_id: session.user_id,
            token: session.token,
            expires_at: session.expires_at,
            created_at: Utc::now(),
        };
        self.lock().sessions.push(session.clone());
        Ok(session)
    }

    async fn delete_by_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<bool, SessionRepositoryError> {
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|s| !(s.user_id == user_id && s.token == token));
        Ok(inner.sessions.len() < before)
    }

    async fn delete_expired_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, SessionRepositoryError> {
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|s| !(s.user_id == user_id && s.expires_at < now));
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[async_trait]
impl PlatformRepository for InMemoryRepositories {
    async fn list_active(&self) -> Result<Vec<DeliveryPlatform>, PlatformRepositoryError> {
        let mut platforms: Vec<_> = self
            .lock()
            .platforms
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        platforms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(platforms)
    }

    async fn search_active(
        &self,
        query: &str,
    ) -> Result<Vec<DeliveryPlatform>, PlatformRepositoryError> {
        let needle = query.to_lowercase();
        let mut platforms: Vec<_> = self
            .lock()
            .platforms
            .iter()
            .filter(|p| p.is_active && p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        platforms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(platforms)
    }

    async fn find_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<DeliveryPlatform>, PlatformRepositoryError> {
        Ok(self
            .lock()
            .platforms
            .iter()
            .find(|p| p.is_active && p.slug == slug)
            .cloned())
    }

    async fn find_active_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<DeliveryPlatform>, PlatformRepositoryError> {
        Ok(self
            .lock()
            .platforms
            .iter()
            .find(|p| p.is_active && p.id == id)
            .cloned())
    }
}

impl StoreInner {
    fn link_view(&self, link: &PlatformLink) -> Option<PlatformLinkView> {
        self.platforms
            .iter()
            .find(|p| p.id == link.platform_id)
            .map(|platform| PlatformLinkView {
                link: link.clone(),
                platform: platform.clone(),
            })
    }
}

#[async_trait]
impl PlatformLinkRepository for InMemoryRepositories {
    async fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PlatformLinkView>, PlatformLinkRepositoryError> {
        let inner = self.lock();
        Ok(inner
            .links
            .iter()
            .filter(|l| l.user_id == user_id && l.is_active)
            .filter_map(|l| inner.link_view(l))
            .collect())
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        link_id: Uuid,
    ) -> Result<Option<PlatformLinkView>, PlatformLinkRepositoryError> {
        let inner = self.lock();
        Ok(inner
            .links
            .iter()
            .find(|l| l.id == link_id && l.user_id == user_id && l.is_active)
            .and_then(|l| inner.link_view(l)))
    }

    async fn find_any_by_platform(
        &self,
        user_id: Uuid,
        platform_id: Uuid,
    ) -> Result<Option<PlatformLink>, PlatformLinkRepositoryError> {
        Ok(self
            .lock()
            .links
            .iter()
            .find(|l| l.user_id == user_id && l.platform_id == platform_id)
            .cloned())
    }

    async fn insert(
        &self,
        link: NewPlatformLink,
    ) -> Result<PlatformLink, PlatformLinkRepositoryError> {
        let mut inner = self.lock();
        if inner
            .links
            .iter()
            .any(|l| l.user_id == link.user_id && l.platform_id == link.platform_id && l.is_active)
        {
            return Err(PlatformLinkRepositoryError::duplicate_link());
        }
        let link = PlatformLink {
            id: link.id,
            user_id: link.user_id,
            platform_id: link.platform_id,
            display_name: link.display_name,
            last_accessed_at: None,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.links.push(link.clone());
        Ok(link)
    }

    async fn reactivate(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        display_name: Option<String>,
    ) -> Result<Option<PlatformLink>, PlatformLinkRepositoryError> {
        let mut inner = self.lock();
        let Some(link) = inner
            .links
            .iter_mut()
            .find(|l| l.id == link_id && l.user_id == user_id)
        else {
            return Ok(None);
        };
        link.is_active = true;
        if display_name.is_some() {
            link.display_name = display_name;
        }
        Ok(Some(link.clone()))
    }

    async fn deactivate(
        &self,
        user_id: Uuid,
        link_id: Uuid,
    ) -> Result<bool, PlatformLinkRepositoryError> {
        let mut inner = self.lock();
        let Some(link) = inner
            .links
            .iter_mut()
            .find(|l| l.id == link_id && l.user_id == user_id && l.is_active)
        else {
            return Ok(false);
        };
        link.is_active = false;
        Ok(true)
    }

    async fn touch_last_accessed(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PlatformLinkView>, PlatformLinkRepositoryError> {
        let mut inner = self.lock();
        let Some(link) = inner
            .links
            .iter_mut()
            .find(|l| l.id == link_id && l.user_id == user_id && l.is_active)
        else {
            return Ok(None);
        };
        link.last_accessed_at = Some(now);
        let link = link.clone();
        Ok(inner.link_view(&link))
    }
}

#[async_trait]
impl RouteRepository for InMemoryRepositories {
    async fn insert(&self, route: NewRoute) -> Result<Route, RouteRepositoryError> {
        let now = Utc::now();
        let route = Route {
            id: route.id,
            user_id: route.user_id,
            platform_link_id: route.platform_link_id,
            name: route.name,
            route_date: route.route_date,
            status: RouteStatus::Assigned,
            total_stops: 0,
            completed_stops: 0,
            total_packages: 0,
            delivered_packages: 0,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().routes.push(route.clone());
        Ok(route)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: RouteFilter,
    ) -> Result<Vec<Route>, RouteRepositoryError> {
        let mut routes: Vec<_> = self
            .lock()
            .routes
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| filter.on.is_none_or(|on| r.route_date == on))
            .filter(|r| filter.status.is_none_or(|status| r.status == status))
            .cloned()
            .collect();
        routes.sort_by(|a, b| {
            b.route_date
                .cmp(&a.route_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(routes)
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<Route>, RouteRepositoryError> {
        Ok(self
            .lock()
            .routes
            .iter()
            .find(|r| r.id == route_id && r.user_id == user_id)
            .cloned())
    }

    async fn find_detail(
        &self,
        user_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<RouteDetail>, RouteRepositoryError> {
        let inner = self.lock();
        let Some(route) = inner
            .routes
            .iter()
            .find(|r| r.id == route_id && r.user_id == user_id)
            .cloned()
        else {
            return Ok(None);
        };
        let mut stops: Vec<_> = inner
            .stops
            .iter()
            .filter(|s| s.route_id == route_id)
            .cloned()
            .collect();
        stops.sort_by_key(|s| s.sequence);
        let mut packages: Vec<_> = inner
            .packages
            .iter()
            .filter(|p| p.route_id == route_id)
            .cloned()
            .collect();
        packages.sort_by_key(|p| p.created_at);
        Ok(Some(RouteDetail {
            route,
            stops,
            packages,
        }))
    }

    async fn apply_route_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        change: RouteStatusChange,
    ) -> Result<Option<Route>, RouteRepositoryError> {
        let mut inner = self.lock();
        let Some(route) = inner
            .routes
            .iter_mut()
            .find(|r| r.id == route_id && r.user_id == user_id)
        else {
            return Ok(None);
        };
        let plan = plan_route_transition(
            RouteProgress {
                status: route.status,
                has_started_at: route.started_at.is_some(),
                has_completed_at: route.completed_at.is_some(),
            },
            change.status,
        );
        route.status = change.status;
        if plan.set_started_at {
            route.started_at = Some(change.now);
        }
        if plan.set_completed_at {
            route.completed_at = Some(change.now);
        }
        route.updated_at = change.now;
        Ok(Some(route.clone()))
    }

    async fn add_stops(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stops: Vec<NewStop>,
    ) -> Result<Option<Vec<Stop>>, RouteRepositoryError> {
        let mut inner = self.lock();
        if !inner
            .routes
            .iter()
            .any(|r| r.id == route_id && r.user_id == user_id)
        {
            return Ok(None);
        }

        let mut running_max = inner
            .stops
            .iter()
            .filter(|s| s.route_id == route_id)
            .map(|s| s.sequence)
            .max()
            .unwrap_or(0);

        let mut inserted = Vec::with_capacity(stops.len());
        for stop in stops {
            let sequence = stop.sequence.unwrap_or(running_max + 1);
            running_max = running_max.max(sequence);
            let stop = Stop {
                id: stop.id,
                route_id,
                sequence,
                address: stop.address,
                label: stop.label,
                notes: stop.notes,
                status: StopStatus::Pending,
                arrived_at: None,
                completed_at: None,
                created_at: Utc::now(),
            };
            inner.stops.push(stop.clone());
            inserted.push(stop);
        }

        let count = inserted.len() as i32;
        if let Some(route) = inner.routes.iter_mut().find(|r| r.id == route_id) {
            route.total_stops += count;
        }
        Ok(Some(inserted))
    }

    async fn find_stop(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stop_id: Uuid,
    ) -> Result<Option<Stop>, RouteRepositoryError> {
        let inner = self.lock();
        if !inner
            .routes
            .iter()
            .any(|r| r.id == route_id && r.user_id == user_id)
        {
            return Ok(None);
        }
        Ok(inner
            .stops
            .iter()
            .find(|s| s.id == stop_id && s.route_id == route_id)
            .cloned())
    }

    async fn apply_stop_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        stop_id: Uuid,
        change: StopStatusChange,
    ) -> Result<Option<StopTransition>, RouteRepositoryError> {
        let mut inner = self.lock();
        if !inner
            .routes
            .iter()
            .any(|r| r.id == route_id && r.user_id == user_id)
        {
            return Ok(None);
        }
        let Some(stop) = inner
            .stops
            .iter_mut()
            .find(|s| s.id == stop_id && s.route_id == route_id)
        else {
            return Ok(None);
        };

        let plan = plan_stop_transition(
            StopProgress {
                status: stop.status,
                has_arrived_at: stop.arrived_at.is_some(),
                has_completed_at: stop.completed_at.is_some(),
            },
            change.status,
            change.policy,
        );
        stop.status = change.status;
        if let Some(notes) = change.notes {
            stop.notes = Some(notes);
        }
        if plan.set_arrived_at {
            stop.arrived_at = Some(change.now);
        }
        if plan.set_completed_at {
            stop.completed_at = Some(change.now);
        }
        let stop = stop.clone();

        let route = inner
            .routes
            .iter_mut()
            .find(|r| r.id == route_id)
            .map(|route| {
                route.completed_stops += plan.completed_delta;
                route.updated_at = change.now;
                route.clone()
            });

        Ok(route.map(|route| StopTransition { stop, route }))
    }
}

#[async_trait]
impl PackageRepository for InMemoryRepositories {
    async fn insert(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        package: NewPackage,
    ) -> Result<Option<Package>, PackageRepositoryError> {
        let mut inner = self.lock();
        if !inner
            .routes
            .iter()
            .any(|r| r.id == route_id && r.user_id == user_id)
        {
            return Ok(None);
        }
        if let Some(barcode) = &package.barcode
            && inner
                .packages
                .iter()
                .any(|p| p.route_id == route_id && p.barcode.as_deref() == Some(barcode))
        {
            return Err(PackageRepositoryError::duplicate_barcode());
        }

        let package = Package {
            id: package.id,
            route_id,
            stop_id: package.stop_id,
            tracking_number: package.tracking_number,
            barcode: package.barcode,
            status: PackageStatus::ScannedIn,
            recipient_name: None,
            notes: None,
            scanned_at: Some(package.scanned_at),
            delivered_at: None,
            created_at: Utc::now(),
        };
        inner.packages.push(package.clone());
        if let Some(route) = inner.routes.iter_mut().find(|r| r.id == route_id) {
            route.total_packages += 1;
        }
        Ok(Some(package))
    }

    async fn list_for_route(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        status: Option<PackageStatus>,
    ) -> Result<Vec<Package>, PackageRepositoryError> {
        let inner = self.lock();
        if !inner
            .routes
            .iter()
            .any(|r| r.id == route_id && r.user_id == user_id)
        {
            return Ok(Vec::new());
        }
        let mut packages: Vec<_> = inner
            .packages
            .iter()
            .filter(|p| p.route_id == route_id)
            .filter(|p| status.is_none_or(|status| p.status == status))
            .cloned()
            .collect();
        packages.sort_by_key(|p| p.created_at);
        Ok(packages)
    }

    async fn apply_scan(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        barcode: &str,
        now: DateTime<Utc>,
        policy: crate::domain::CounterPolicy,
    ) -> Result<Option<PackageTransition>, PackageRepositoryError> {
        let next = {
            let inner = self.lock();
            if !inner
                .routes
                .iter()
                .any(|r| r.id == route_id && r.user_id == user_id)
            {
                return Ok(None);
            }
            let Some(package) = inner
                .packages
                .iter()
                .find(|p| p.route_id == route_id && p.barcode.as_deref() == Some(barcode))
            else {
                return Ok(None);
            };
            package.status.next_scan_status()
        };

        self.transition_package_by(
            route_id,
            |p| p.barcode.as_deref() == Some(barcode),
            next,
            None,
            None,
            now,
            policy,
        )
    }

    async fn apply_package_transition(
        &self,
        user_id: Uuid,
        route_id: Uuid,
        package_id: Uuid,
        change: PackageStatusChange,
    ) -> Result<Option<PackageTransition>, PackageRepositoryError> {
        if !self
            .lock()
            .routes
            .iter()
            .any(|r| r.id == route_id && r.user_id == user_id)
        {
            return Ok(None);
        }
        self.transition_package_by(
            route_id,
            |p| p.id == package_id,
            change.status,
            change.notes,
            change.recipient_name,
            change.now,
            change.policy,
        )
    }
}

impl InMemoryRepositories {
    #[expect(clippy::too_many_arguments, reason = "internal helper")]
    fn transition_package_by(
        &self,
        route_id: Uuid,
        select: impl Fn(&Package) -> bool,
        next: PackageStatus,
        notes: Option<String>,
        recipient_name: Option<String>,
        now: DateTime<Utc>,
        policy: crate::domain::CounterPolicy,
    ) -> Result<Option<PackageTransition>, PackageRepositoryError> {
        let mut inner = self.lock();
        let Some(package) = inner
            .packages
            .iter_mut()
            .find(|p| p.route_id == route_id && select(p))
        else {
            return Ok(None);
        };

        let plan = plan_package_transition(
            PackageProgress {
                status: package.status,
                has_scanned_at: package.scanned_at.is_some(),
                has_delivered_at: package.delivered_at.is_some(),
            },
            next,
            policy,
        );
        package.status = next;
        if let Some(notes) = notes {
            package.notes = Some(notes);
        }
        if let Some(recipient) = recipient_name {
            package.recipient_name = Some(recipient);
        }
        if plan.set_scanned_at {
            package.scanned_at = Some(now);
        }
        if plan.set_delivered_at {
            package.delivered_at = Some(now);
        }
        let package = package.clone();

        let route = inner
            .routes
            .iter_mut()
            .find(|r| r.id == route_id)
            .map(|route| {
                route.delivered_packages += plan.delivered_delta;
                route.updated_at = now;
                route.clone()
            });

        Ok(route.map(|route| PackageTransition { package, route }))
    }
}

#[async_trait]
impl EarningsRepository for InMemoryRepositories {
    async fn insert(
        &self,
        record: NewEarningRecord,
    ) -> Result<EarningRecord, EarningsRepositoryError> {
        let record = EarningRecord {
            id: record.id,
            user_id: record.user_id,
            platform_link_id: record.platform_link_id,
            amount_cents: record.amount_cents,
            tips_cents: record.tips_cents,
            currency: record.currency,
            earned_on: record.earned_on,
            note: record.note,
            created_at: Utc::now(),
        };
        self.lock().earnings.push(record.clone());
        Ok(record)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<EarningRecord>, EarningsRepositoryError> {
        let mut records: Vec<_> = self
            .lock()
            .earnings
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| from.is_none_or(|from| r.earned_on >= from))
            .filter(|r| to.is_none_or(|to| r.earned_on <= to))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.earned_on
                .cmp(&a.earned_on)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    async fn summarize(
        &self,
        user_id: Uuid,
        windows: EarningsWindows,
    ) -> Result<EarningsSummary, EarningsRepositoryError> {
        let inner = self.lock();
        let totals = |keep: &dyn Fn(NaiveDate) -> bool| {
            let mut acc = EarningsTotals::default();
            for record in inner
                .earnings
                .iter()
                .filter(|r| r.user_id == user_id && keep(r.earned_on))
            {
                acc.amount_cents += record.amount_cents;
                acc.tips_cents += record.tips_cents;
                acc.record_count += 1;
            }
            acc
        };
        Ok(EarningsSummary {
            today: totals(&|d| d == windows.today),
            week: totals(&|d| d >= windows.week_start),
            month: totals(&|d| d >= windows.month_start),
            all_time: totals(&|_| true),
        })
    }
}

#[async_trait]
impl ShiftRepository for InMemoryRepositories {
    async fn insert(&self, shift: NewShift) -> Result<Shift, ShiftRepositoryError> {
        let shift = Shift {
            id: shift.id,
            user_id: shift.user_id,
            status: ShiftStatus::Active,
            started_at: shift.started_at,
            ended_at: None,
            created_at: Utc::now(),
        };
        self.lock().shifts.push(shift.clone());
        Ok(shift)
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Shift>, ShiftRepositoryError> {
        Ok(self
            .lock()
            .shifts
            .iter()
            .filter(|s| s.user_id == user_id && s.status == ShiftStatus::Active)
            .max_by_key(|s| s.started_at)
            .cloned())
    }

    async fn apply_shift_transition(
        &self,
        user_id: Uuid,
        shift_id: Uuid,
        change: ShiftStatusChange,
    ) -> Result<Option<Shift>, ShiftRepositoryError> {
        let mut inner = self.lock();
        let Some(shift) = inner
            .shifts
            .iter_mut()
            .find(|s| s.id == shift_id && s.user_id == user_id)
        else {
            return Ok(None);
        };
        if shift.status == ShiftStatus::Active
            && change.status != ShiftStatus::Active
            && shift.ended_at.is_none()
        {
            shift.ended_at = Some(change.now);
        }
        shift.status = change.status;
        Ok(Some(shift.clone()))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Shift>, ShiftRepositoryError> {
        let mut shifts: Vec<_> = self
            .lock()
            .shifts
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| on.is_none_or(|on| s.started_at.date_naive() == on))
            .cloned()
            .collect();
        shifts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(shifts)
    }
}

#[async_trait]
impl HubRepository for InMemoryRepositories {
    async fn create_with_owner(
        &self,
        hub: NewHub,
        membership_id: Uuid,
    ) -> Result<(Hub, HubMembership), HubRepositoryError> {
        let mut inner = self.lock();
        if inner
            .memberships
            .iter()
            .any(|m| m.user_id == hub.created_by)
        {
            return Err(HubRepositoryError::duplicate_membership());
        }
        let now = Utc::now();
        let hub_record = Hub {
            id: hub.id,
            name: hub.name,
            city: hub.city,
            created_by: hub.created_by,
            created_at: now,
        };
        let membership = HubMembership {
            id: membership_id,
            hub_id: hub_record.id,
            user_id: hub.created_by,
            role: HubRole::Owner,
            joined_at: now,
        };
        inner.hubs.push(hub_record.clone());
        inner.memberships.push(membership.clone());
        if let Some((user, _)) = inner
            .users
            .iter_mut()
            .find(|(user, _)| user.id == hub_record.created_by)
            && user.role == UserRole::Worker
        {
            user.role = UserRole::HubAdmin;
        }
        Ok((hub_record, membership))
    }

    async fn search(&self, query: &str) -> Result<Vec<Hub>, HubRepositoryError> {
        let needle = query.to_lowercase();
        let mut hubs: Vec<_> = self
            .lock()
            .hubs
            .iter()
            .filter(|h| {
                needle.is_empty()
                    || h.name.to_lowercase().contains(&needle)
                    || h.city
                        .as_ref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        hubs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hubs)
    }

    async fn find_by_id(&self, hub_id: Uuid) -> Result<Option<Hub>, HubRepositoryError> {
        Ok(self.lock().hubs.iter().find(|h| h.id == hub_id).cloned())
    }

    async fn membership_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(HubMembership, Hub)>, HubRepositoryError> {
        let inner = self.lock();
        Ok(inner
            .memberships
            .iter()
            .find(|m| m.user_id == user_id)
            .and_then(|m| {
                inner
                    .hubs
                    .iter()
                    .find(|h| h.id == m.hub_id)
                    .map(|h| (m.clone(), h.clone()))
            }))
    }

    async fn insert_membership(
        &self,
        membership: NewHubMembership,
    ) -> Result<HubMembership, HubRepositoryError> {
        let mut inner = self.lock();
        if inner
            .memberships
            .iter()
            .any(|m| m.user_id == membership.user_id)
        {
            return Err(HubRepositoryError::duplicate_membership());
        }
        let membership = HubMembership {
            id: membership.id,
            hub_id: membership.hub_id,
            user_id: membership.user_id,
            role: membership.role,
            joined_at: Utc::now(),
        };
        inner.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn list_members(&self, hub_id: Uuid) -> Result<Vec<HubMember>, HubRepositoryError> {
        let inner = self.lock();
        let mut members: Vec<_> = inner
            .memberships
            .iter()
            .filter(|m| m.hub_id == hub_id)
            .filter_map(|m| {
                inner
                    .users
                    .iter()
                    .find(|(user, _)| user.id == m.user_id)
                    .map(|(user, _)| HubMember {
                        membership: m.clone(),
                        display_name: user.display_name.clone(),
                        email: user.email.as_str().to_owned(),
                    })
            })
            .collect();
        members.sort_by_key(|m| m.membership.joined_at);
        Ok(members)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepositories {
    async fn unread_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, NotificationRepositoryError> {
        Ok(self.lock().unread.get(&user_id).copied().unwrap_or(0))
    }
}

/// Reversible stand-in for bcrypt so test flows stay fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextHasher;

#[async_trait]
impl PasswordHasher for PlainTextHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHasherError> {
        Ok(format!("plain:{password}"))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHasherError> {
        Ok(hash == format!("plain:{password}"))
    }
}

/// Signing secret shared by test states.
pub const TEST_TOKEN_SECRET: &[u8] = b"test-token-secret";

/// Build an [`HttpState`] wired entirely to one in-memory store.
///
/// Returns the store too so tests can seed data and assert on raw rows.
pub fn test_http_state() -> (HttpState, Arc<InMemoryRepositories>) {
    let repos = Arc::new(InMemoryRepositories::new());
    let tokens: Arc<dyn TokenCodec> = Arc::new(JwtTokenCodec::new(TEST_TOKEN_SECRET));
    let hasher: Arc<dyn PasswordHasher> = Arc::new(PlainTextHasher);

    let state = HttpState {
        auth: AuthService::new(
            repos.clone(),
            repos.clone(),
            hasher,
            tokens.clone(),
        ),
        platforms: PlatformService::new(repos.clone()),
        dashboard: DashboardService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
        ),
        routes: RouteService::new(repos.clone(), repos.clone(), repos.clone()),
        earnings: EarningsService::new(repos.clone(), repos.clone()),
        shifts: ShiftService::new(repos.clone()),
        hubs: HubService::new(repos.clone()),
        tokens,
    };
    (state, repos)
}

/// Issue a bearer token for an arbitrary user id, for tests that skip
/// the register flow.
pub fn test_token_for(user_id: Uuid) -> String {
    let codec = JwtTokenCodec::new(TEST_TOKEN_SECRET);
    codec
        .issue(&AccessClaims {
            sub: user_id,
            jti: Uuid::new_v4(),
            email: "fixture@example.com".to_owned(),
            role: UserRole::Worker,
            exp: (Utc::now() + chrono::Duration::days(1)).timestamp(),
        })
        .expect("fixture token issues")
}
