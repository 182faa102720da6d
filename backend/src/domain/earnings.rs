//! Earnings ledger entities and money handling.
//!
//! Amounts are integer cents end to end. The API boundary accepts and
//! emits decimal strings ("12.50") which are parsed here without ever
//! touching floating point.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One append-only earnings entry.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarningRecord {
    /// Primary key.
    pub id: Uuid,
    /// Owning worker.
    pub user_id: Uuid,
    /// Platform link the earnings came from, when attributed.
    pub platform_link_id: Option<Uuid>,
    /// Base pay in cents.
    #[schema(example = 1250)]
    pub amount_cents: i64,
    /// Tips in cents.
    #[schema(example = 300)]
    pub tips_cents: i64,
    /// ISO 4217 currency code.
    #[schema(example = "USD")]
    pub currency: String,
    /// Day the money was earned.
    pub earned_on: NaiveDate,
    /// Free-form note.
    pub note: Option<String>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl EarningRecord {
    /// Base pay plus tips.
    pub fn total_cents(&self) -> i64 {
        self.amount_cents + self.tips_cents
    }
}

/// Aggregate totals for one summary window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarningsTotals {
    /// Sum of base pay in cents.
    pub amount_cents: i64,
    /// Sum of tips in cents.
    pub tips_cents: i64,
    /// Number of records in the window.
    pub record_count: i64,
}

/// Today / week / month / all-time aggregates, computed database-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    /// Records dated today.
    pub today: EarningsTotals,
    /// Records from the last seven days, today inclusive.
    pub week: EarningsTotals,
    /// Records from the first of the current month.
    pub month: EarningsTotals,
    /// Every record.
    pub all_time: EarningsTotals,
}

/// Parse a decimal money string into cents.
///
/// Accepts plain digits with at most two fraction digits. Signs are
/// rejected (the ledger is append-only income). Returns `None` for
/// anything else.
pub fn parse_money_cents(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.starts_with('+') {
        return None;
    }
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }
    let whole_cents = whole
        .parse::<i64>()
        .ok()
        .or(if whole.is_empty() { Some(0) } else { None })?
        .checked_mul(100)?;
    let frac_cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse::<i64>().ok()?,
    };
    whole_cents.checked_add(frac_cents)
}

/// Render cents as a decimal string, the inverse of [`parse_money_cents`].
pub fn format_money_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12.50", Some(1250))]
    #[case("12.5", Some(1250))]
    #[case("12", Some(1200))]
    #[case("0.05", Some(5))]
    #[case(".99", Some(99))]
    #[case("  7.25 ", Some(725))]
    #[case("0", Some(0))]
    #[case("12.505", None)]
    #[case("-1.00", None)]
    #[case("+1.00", None)]
    #[case("twelve", None)]
    #[case("", None)]
    #[case(".", None)]
    #[case("1,200", None)]
    fn money_parsing(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_money_cents(raw), expected);
    }

    #[rstest]
    #[case(1250, "12.50")]
    #[case(5, "0.05")]
    #[case(0, "0.00")]
    #[case(120_000, "1200.00")]
    fn money_formatting(#[case] cents: i64, #[case] expected: &str) {
        assert_eq!(format_money_cents(cents), expected);
    }

    #[rstest]
    fn format_round_trips_through_parse() {
        for cents in [0_i64, 1, 99, 100, 1250, 987_654] {
            assert_eq!(parse_money_cents(&format_money_cents(cents)), Some(cents));
        }
    }

    #[rstest]
    fn total_adds_tips() {
        let record = EarningRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            platform_link_id: None,
            amount_cents: 1250,
            tips_cents: 300,
            currency: "USD".to_owned(),
            earned_on: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
            note: None,
            created_at: Utc::now(),
        };
        assert_eq!(record.total_cents(), 1550);
    }
}
