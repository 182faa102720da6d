//! Earnings ledger service.

use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use uuid::Uuid;

use super::earnings::{parse_money_cents, EarningRecord, EarningsSummary};
use super::error::Error;
use super::ports::{
    EarningsRepository, EarningsRepositoryError, EarningsWindows, NewEarningRecord,
    PlatformLinkRepository, PlatformLinkRepositoryError,
};

/// Days in the week summary window, today inclusive.
const WEEK_WINDOW_DAYS: u64 = 7;

pub(crate) fn map_earnings_repo_error(error: EarningsRepositoryError) -> Error {
    match error {
        EarningsRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("earnings repository unavailable: {message}"))
        }
        EarningsRepositoryError::Query { message } => {
            Error::internal(format!("earnings repository error: {message}"))
        }
    }
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

/// Validated payload for one ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EarningDraft {
    /// Attribution to one of the worker's platform links.
    pub platform_link_id: Option<Uuid>,
    /// Base pay in cents.
    pub amount_cents: i64,
    /// Tips in cents.
    pub tips_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Day the money was earned; defaults to today when omitted.
    pub earned_on: Option<NaiveDate>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Validation errors for [`EarningDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EarningDraftValidationError {
    /// The amount string did not parse as non-negative money.
    #[error("amount must be a non-negative decimal with at most two fraction digits")]
    InvalidAmount,
    /// The tips string did not parse as non-negative money.
    #[error("tips must be a non-negative decimal with at most two fraction digits")]
    InvalidTips,
    /// The currency is not a three-letter code.
    #[error("currency must be a three-letter code")]
    InvalidCurrency,
}

impl EarningDraft {
    /// Validate raw request parts. `amount` and `tips` are decimal
    /// strings; `tips` and `currency` fall back to `"0"` and `"USD"`.
    pub fn try_from_parts(
        amount: &str,
        tips: Option<&str>,
        currency: Option<&str>,
        platform_link_id: Option<Uuid>,
        earned_on: Option<NaiveDate>,
        note: Option<String>,
    ) -> Result<Self, EarningDraftValidationError> {
        let amount_cents =
            parse_money_cents(amount).ok_or(EarningDraftValidationError::InvalidAmount)?;
        let tips_cents = match tips {
            Some(raw) => {
                parse_money_cents(raw).ok_or(EarningDraftValidationError::InvalidTips)?
            }
            None => 0,
        };
        let currency = currency.unwrap_or("USD").trim().to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(EarningDraftValidationError::InvalidCurrency);
        }
        Ok(Self {
            platform_link_id,
            amount_cents,
            tips_cents,
            currency,
            earned_on,
            note,
        })
    }
}

/// Append-only ledger operations and aggregates.
#[derive(Clone)]
pub struct EarningsService {
    earnings: Arc<dyn EarningsRepository>,
    links: Arc<dyn PlatformLinkRepository>,
}

impl EarningsService {
    /// Create the service from its ports.
    pub fn new(
        earnings: Arc<dyn EarningsRepository>,
        links: Arc<dyn PlatformLinkRepository>,
    ) -> Self {
        Self { earnings, links }
    }

    /// Append one entry. A supplied platform link must be the caller's.
    pub async fn record_earning(
        &self,
        user_id: Uuid,
        draft: EarningDraft,
        today: NaiveDate,
    ) -> Result<EarningRecord, Error> {
        if let Some(link_id) = draft.platform_link_id {
            self.links
                .find_for_user(user_id, link_id)
                .await
                .map_err(map_link_repo_error)?
                .ok_or_else(|| Error::not_found("platform link not found"))?;
        }

        self.earnings
            .insert(NewEarningRecord {
                id: Uuid::new_v4(),
                user_id,
                platform_link_id: draft.platform_link_id,
                amount_cents: draft.amount_cents,
                tips_cents: draft.tips_cents,
                currency: draft.currency,
                earned_on: draft.earned_on.unwrap_or(today),
                note: draft.note,
            })
            .await
            .map_err(map_earnings_repo_error)
    }

    /// Entries of the caller, newest first, optionally date-bounded.
    pub async fn list_earnings(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<EarningRecord>, Error> {
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(Error::invalid_request("from must not be after to"));
        }
        self.earnings
            .list_for_user(user_id, from, to)
            .await
            .map_err(map_earnings_repo_error)
    }

    /// Today / week / month / all-time aggregates, computed in SQL.
    pub async fn summary(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<EarningsSummary, Error> {
        let week_start = today
            .checked_sub_days(Days::new(WEEK_WINDOW_DAYS - 1))
            .unwrap_or(today);
        let month_start = today.with_day(1).unwrap_or(today);

        self.earnings
            .summarize(
                user_id,
                EarningsWindows {
                    today,
                    week_start,
                    month_start,
                },
            )
            .await
            .map_err(map_earnings_repo_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockEarningsRepository, MockPlatformLinkRepository};
    use mockall::predicate::{always, eq};
    use rstest::rstest;

    #[rstest]
    #[case("12.50", None, 1250, 0)]
    #[case("12.50", Some("1.5"), 1250, 150)]
    #[case("0", Some("0"), 0, 0)]
    fn draft_parses_money(
        #[case] amount: &str,
        #[case] tips: Option<&str>,
        #[case] expected_amount: i64,
        #[case] expected_tips: i64,
    ) {
        let draft = EarningDraft::try_from_parts(amount, tips, None, None, None, None)
            .expect("valid draft");
        assert_eq!(draft.amount_cents, expected_amount);
        assert_eq!(draft.tips_cents, expected_tips);
        assert_eq!(draft.currency, "USD");
    }

    #[rstest]
    #[case("-5", None, EarningDraftValidationError::InvalidAmount)]
    #[case("12.5", Some("abc"), EarningDraftValidationError::InvalidTips)]
    fn draft_rejects_bad_money(
        #[case] amount: &str,
        #[case] tips: Option<&str>,
        #[case] expected: EarningDraftValidationError,
    ) {
        let err = EarningDraft::try_from_parts(amount, tips, None, None, None, None)
            .expect_err("invalid");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn draft_rejects_bad_currency() {
        let err = EarningDraft::try_from_parts("1", None, Some("DOLLARS"), None, None, None)
            .expect_err("invalid");
        assert_eq!(err, EarningDraftValidationError::InvalidCurrency);
    }

    #[rstest]
    #[tokio::test]
    async fn recording_against_a_foreign_link_is_not_found() {
        let mut links = MockPlatformLinkRepository::new();
        links.expect_find_for_user().returning(|_, _| Ok(None));

        let svc = EarningsService::new(Arc::new(MockEarningsRepository::new()), Arc::new(links));
        let draft = EarningDraft::try_from_parts(
            "10.00",
            None,
            None,
            Some(Uuid::new_v4()),
            None,
            None,
        )
        .expect("valid draft");

        let err = svc
            .record_earning(Uuid::new_v4(), draft, chrono::Utc::now().date_naive())
            .await
            .expect_err("foreign link");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn inverted_date_range_is_rejected() {
        let svc = EarningsService::new(
            Arc::new(MockEarningsRepository::new()),
            Arc::new(MockPlatformLinkRepository::new()),
        );
        let from = NaiveDate::from_ymd_opt(2025, 6, 10).expect("valid date");
        let to = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");

        let err = svc
            .list_earnings(Uuid::new_v4(), Some(from), Some(to))
            .await
            .expect_err("inverted range");
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn summary_windows_are_derived_from_today() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date");
        let expected = EarningsWindows {
            today,
            week_start: NaiveDate::from_ymd_opt(2025, 6, 9).expect("valid date"),
            month_start: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        };

        let mut earnings = MockEarningsRepository::new();
        earnings
            .expect_summarize()
            .with(always(), eq(expected))
            .times(1)
            .returning(|_, _| Ok(EarningsSummary::default()));

        let svc = EarningsService::new(
            Arc::new(earnings),
            Arc::new(MockPlatformLinkRepository::new()),
        );
        svc.summary(Uuid::new_v4(), today).await.expect("summary");
    }
}
