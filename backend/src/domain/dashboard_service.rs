//! Dashboard aggregation and platform link management.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::Error;
use super::platform::PlatformLinkView;
use super::platform_service::map_platform_repo_error;
use super::ports::{
    EarningsRepository, NewPlatformLink, NotificationRepository, NotificationRepositoryError,
    PlatformLinkRepository, PlatformLinkRepositoryError, PlatformRepository, ShiftRepository,
};
use super::shift::Shift;

/// Days of history folded into the dashboard earnings figure, today
/// inclusive.
const DASHBOARD_EARNINGS_DAYS: u64 = 7;

/// In-process fold over the fetched 7-day records.
///
/// Deliberately not a SQL aggregate: the summary endpoint aggregates
/// database-side, this view sums the rows it fetched. Both strategies
/// are kept from the original product behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekEarnings {
    /// Base pay plus tips over the window, in cents.
    pub total_cents: i64,
    /// Tips alone, in cents.
    pub tips_cents: i64,
    /// Number of records in the window.
    pub record_count: i64,
}

/// Everything the dashboard screen renders, one response.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// The worker's active platform links.
    pub platform_links: Vec<PlatformLinkView>,
    /// Shifts started today.
    pub todays_shifts: Vec<Shift>,
    /// Last-seven-day earnings, folded in process.
    pub week_earnings: WeekEarnings,
    /// Unread notification badge count.
    pub unread_notifications: i64,
}

fn map_link_repo_error(error: PlatformLinkRepositoryError) -> Error {
    match error {
        PlatformLinkRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("platform link repository unavailable: {message}"))
        }
        PlatformLinkRepositoryError::Query { message } => {
            Error::internal(format!("platform link repository error: {message}"))
        }
        PlatformLinkRepositoryError::DuplicateLink => {
            Error::conflict("platform is already linked")
        }
    }
}

fn map_notification_repo_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

/// Dashboard aggregation plus the platform-link lifecycle.
#[derive(Clone)]
pub struct DashboardService {
    links: Arc<dyn PlatformLinkRepository>,
    platforms: Arc<dyn PlatformRepository>,
    shifts: Arc<dyn ShiftRepository>,
    earnings: Arc<dyn EarningsRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl DashboardService {
    /// Create the service from its ports.
    pub fn new(
        links: Arc<dyn PlatformLinkRepository>,
        platforms: Arc<dyn PlatformRepository>,
        shifts: Arc<dyn ShiftRepository>,
        earnings: Arc<dyn EarningsRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            links,
            platforms,
            shifts,
            earnings,
            notifications,
        }
    }

    /// Fan out the four dashboard reads concurrently and fold them into
    /// one view.
    pub async fn dashboard(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<DashboardView, Error> {
        let week_start = today
            .checked_sub_days(Days::new(DASHBOARD_EARNINGS_DAYS - 1))
            .unwrap_or(today);

        let (links, shifts, records, unread) = tokio::join!(
            self.links.list_active_for_user(user_id),
            self.shifts.list_for_user(user_id, Some(today)),
            self.earnings
                .list_for_user(user_id, Some(week_start), Some(today)),
            self.notifications.unread_count_for_user(user_id),
        );

        let links = links.map_err(map_link_repo_error)?;
        let shifts = shifts.map_err(crate::domain::shift_service::map_shift_repo_error)?;
        let records =
            records.map_err(crate::domain::earnings_service::map_earnings_repo_error)?;
        let unread = unread.map_err(map_notification_repo_error)?;

        let week_earnings = WeekEarnings {
            total_cents: records.iter().map(|r| r.total_cents()).sum(),
            tips_cents: records.iter().map(|r| r.tips_cents).sum(),
            record_count: records.len() as i64,
        };

        Ok(DashboardView {
            platform_links: links,
            todays_shifts: shifts,
            week_earnings,
            unread_notifications: unread,
        })
    }

    /// Link the caller to a catalog platform.
    ///
    /// A soft-deactivated link for the same pair is reactivated in place
    /// so its history (and foreign keys) survive.
    pub async fn link_platform(
        &self,
        user_id: Uuid,
        platform_id: Uuid,
        display_name: Option<String>,
    ) -> Result<PlatformLinkView, Error> {
        let platform = self
            .platforms
            .find_active_by_id(platform_id)
            .await
            .map_err(map_platform_repo_error)?
            .ok_or_else(|| Error::not_found("platform not found"))?;

        match self
            .links
            .find_any_by_platform(user_id, platform_id)
            .await
            .map_err(map_link_repo_error)?
        {
            Some(existing) if existing.is_active => {
                Err(Error::conflict("platform is already linked"))
            }
            Some(existing) => {
                let link = self
                    .links
                    .reactivate(user_id, existing.id, display_name)
                    .await
                    .map_err(map_link_repo_error)?
                    .ok_or_else(|| Error::not_found("platform link not found"))?;
                Ok(PlatformLinkView { link, platform })
            }
            None => {
                let link = self
                    .links
                    .insert(NewPlatformLink {
                        id: Uuid::new_v4(),
                        user_id,
                        platform_id,
                        display_name,
                    })
                    .await
                    .map_err(map_link_repo_error)?;
                Ok(PlatformLinkView { link, platform })
            }
        }
    }

    /// Soft-deactivate one of the caller's links.
    pub async fn unlink_platform(&self, user_id: Uuid, link_id: Uuid) -> Result<(), Error> {
        let deactivated = self
            .links
            .deactivate(user_id, link_id)
            .await
            .map_err(map_link_repo_error)?;
        if deactivated {
            Ok(())
        } else {
            Err(Error::not_found("platform link not found"))
        }
    }

    /// Stamp `last_accessed_at` and hand back the launch targets.
    pub async fn launch_platform(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PlatformLinkView, Error> {
        self.links
            .touch_last_accessed(user_id, link_id, now)
            .await
            .map_err(map_link_repo_error)?
            .ok_or_else(|| Error::not_found("platform link not found"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::earnings::EarningRecord;
    use crate::domain::platform::{DeliveryPlatform, PlatformLink};
    use crate::domain::ports::{
        MockEarningsRepository, MockNotificationRepository, MockPlatformLinkRepository,
        MockPlatformRepository, MockShiftRepository,
    };
    use rstest::rstest;

    fn sample_platform(id: Uuid) -> DeliveryPlatform {
        DeliveryPlatform {
            id,
            name: "Amazon Flex".to_owned(),
            slug: "amazon-flex".to_owned(),
            deep_link_url: Some("flexapp://".to_owned()),
            web_portal_url: None,
            package_id_hint: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_link(user_id: Uuid, platform_id: Uuid, active: bool) -> PlatformLink {
        PlatformLink {
            id: Uuid::new_v4(),
            user_id,
            platform_id,
            display_name: None,
            last_accessed_at: None,
            is_active: active,
            created_at: Utc::now(),
        }
    }

    fn sample_record(user_id: Uuid, amount: i64, tips: i64) -> EarningRecord {
        EarningRecord {
            id: Uuid::new_v4(),
            user_id,
            platform_link_id: None,
            amount_cents: amount,
            tips_cents: tips,
            currency: "USD".to_owned(),
            earned_on: Utc::now().date_naive(),
            note: None,
            created_at: Utc::now(),
        }
    }

    fn service(
        links: MockPlatformLinkRepository,
        platforms: MockPlatformRepository,
        shifts: MockShiftRepository,
        earnings: MockEarningsRepository,
        notifications: MockNotificationRepository,
    ) -> DashboardService {
        DashboardService::new(
            Arc::new(links),
            Arc::new(platforms),
            Arc::new(shifts),
            Arc::new(earnings),
            Arc::new(notifications),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn dashboard_folds_week_earnings_in_process() {
        let user_id = Uuid::new_v4();

        let mut links = MockPlatformLinkRepository::new();
        links
            .expect_list_active_for_user()
            .returning(|_| Ok(Vec::new()));
        let mut shifts = MockShiftRepository::new();
        shifts.expect_list_for_user().returning(|_, _| Ok(Vec::new()));
        let mut earnings = MockEarningsRepository::new();
        earnings.expect_list_for_user().returning(move |uid, _, _| {
            Ok(vec![
                sample_record(uid, 1000, 200),
                sample_record(uid, 2500, 0),
            ])
        });
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_unread_count_for_user()
            .returning(|_| Ok(4));

        let svc = service(
            links,
            MockPlatformRepository::new(),
            shifts,
            earnings,
            notifications,
        );
        let view = svc
            .dashboard(user_id, Utc::now().date_naive())
            .await
            .expect("dashboard loads");

        assert_eq!(view.week_earnings.total_cents, 3700);
        assert_eq!(view.week_earnings.tips_cents, 200);
        assert_eq!(view.week_earnings.record_count, 2);
        assert_eq!(view.unread_notifications, 4);
    }

    #[rstest]
    #[tokio::test]
    async fn linking_unknown_platform_is_not_found() {
        let mut platforms = MockPlatformRepository::new();
        platforms.expect_find_active_by_id().returning(|_| Ok(None));

        let svc = service(
            MockPlatformLinkRepository::new(),
            platforms,
            MockShiftRepository::new(),
            MockEarningsRepository::new(),
            MockNotificationRepository::new(),
        );
        let err = svc
            .link_platform(Uuid::new_v4(), Uuid::new_v4(), None)
            .await
            .expect_err("unknown platform");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn linking_twice_is_conflict() {
        let platform_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut platforms = MockPlatformRepository::new();
        platforms
            .expect_find_active_by_id()
            .returning(move |id| Ok(Some(sample_platform(id))));
        let mut links = MockPlatformLinkRepository::new();
        links
            .expect_find_any_by_platform()
            .returning(move |uid, pid| Ok(Some(sample_link(uid, pid, true))));

        let svc = service(
            links,
            platforms,
            MockShiftRepository::new(),
            MockEarningsRepository::new(),
            MockNotificationRepository::new(),
        );
        let err = svc
            .link_platform(user_id, platform_id, None)
            .await
            .expect_err("already linked");
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn relinking_reactivates_the_old_row() {
        let platform_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut platforms = MockPlatformRepository::new();
        platforms
            .expect_find_active_by_id()
            .returning(move |id| Ok(Some(sample_platform(id))));
        let mut links = MockPlatformLinkRepository::new();
        links
            .expect_find_any_by_platform()
            .returning(move |uid, pid| Ok(Some(sample_link(uid, pid, false))));
        links.expect_reactivate().times(1).returning(|uid, lid, name| {
            Ok(Some(PlatformLink {
                id: lid,
                user_id: uid,
                platform_id: Uuid::new_v4(),
                display_name: name,
                last_accessed_at: None,
                is_active: true,
                created_at: Utc::now(),
            }))
        });
        links.expect_insert().never();

        let svc = service(
            links,
            platforms,
            MockShiftRepository::new(),
            MockEarningsRepository::new(),
            MockNotificationRepository::new(),
        );
        let view = svc
            .link_platform(user_id, platform_id, Some("Flex".to_owned()))
            .await
            .expect("relink succeeds");
        assert!(view.link.is_active);
        assert_eq!(view.link.display_name.as_deref(), Some("Flex"));
    }

    #[rstest]
    #[tokio::test]
    async fn unlinking_a_foreign_link_is_not_found() {
        let mut links = MockPlatformLinkRepository::new();
        links.expect_deactivate().returning(|_, _| Ok(false));

        let svc = service(
            links,
            MockPlatformRepository::new(),
            MockShiftRepository::new(),
            MockEarningsRepository::new(),
            MockNotificationRepository::new(),
        );
        let err = svc
            .unlink_platform(Uuid::new_v4(), Uuid::new_v4())
            .await
            .expect_err("foreign link");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
