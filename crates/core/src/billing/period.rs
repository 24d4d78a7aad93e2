//! Billing period resolution.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::BillingError;

/// A resolved billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// First day of the period (inclusive).
    pub start: NaiveDate,
    /// Last day of the period (inclusive).
    pub end: NaiveDate,
    /// Display token, `YYYY-MM`. For an explicit start/end pair this is
    /// derived from the start date and does not imply a full month.
    pub month: String,
}

impl BillingPeriod {
    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Resolves a caller-supplied period descriptor into a concrete date range.
///
/// Exactly one input form is honored, in this order:
/// - `month` token `YYYY-MM`: first through last calendar day of that month,
///   token echoed verbatim;
/// - explicit `start`/`end` pair: the range as given (both bounds required);
/// - neither: the calendar month containing `today`.
///
/// All calendar math is plain UTC dates; no timezone shifting.
///
/// # Errors
///
/// Returns [`BillingError::InvalidPeriod`] for a malformed month token or a
/// partially supplied start/end pair.
pub fn resolve_period(
    month: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<BillingPeriod, BillingError> {
    if let Some(token) = month {
        let (year, month_number) = parse_month_token(token)?;
        let start = first_day(year, month_number, token)?;
        return Ok(BillingPeriod {
            start,
            end: last_day_of_month(start),
            month: token.to_string(),
        });
    }

    if start.is_some() || end.is_some() {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(BillingError::InvalidPeriod(
                "Both startDate and endDate are required when month is not provided".to_string(),
            ));
        };
        return Ok(BillingPeriod {
            start,
            end,
            month: format!("{:04}-{:02}", start.year(), start.month()),
        });
    }

    let start = today.with_day(1).unwrap_or(today);
    Ok(BillingPeriod {
        start,
        end: last_day_of_month(start),
        month: format!("{:04}-{:02}", today.year(), today.month()),
    })
}

fn parse_month_token(token: &str) -> Result<(i32, u32), BillingError> {
    let invalid =
        || BillingError::InvalidPeriod(format!("month must be formatted as YYYY-MM, got '{token}'"));

    let (year_raw, month_raw) = token.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year_raw.parse().map_err(|_| invalid())?;
    let month_number: u32 = month_raw.parse().map_err(|_| invalid())?;
    Ok((year, month_number))
}

fn first_day(year: i32, month: u32, token: &str) -> Result<NaiveDate, BillingError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        BillingError::InvalidPeriod(format!("month must be formatted as YYYY-MM, got '{token}'"))
    })
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (next_year, next_month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    // The first of the next month always exists, as does its predecessor.
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_token_resolves_full_month() {
        let period = resolve_period(Some("2024-02"), None, None, date(2025, 6, 1)).unwrap();
        // Leap year February.
        assert_eq!(period.start, date(2024, 2, 1));
        assert_eq!(period.end, date(2024, 2, 29));
        assert_eq!(period.month, "2024-02");
    }

    #[test]
    fn test_month_token_december_rolls_over_year() {
        let period = resolve_period(Some("2024-12"), None, None, date(2025, 6, 1)).unwrap();
        assert_eq!(period.start, date(2024, 12, 1));
        assert_eq!(period.end, date(2024, 12, 31));
    }

    #[test]
    fn test_explicit_pair_single_day() {
        let period = resolve_period(
            None,
            Some(date(2024, 3, 10)),
            Some(date(2024, 3, 10)),
            date(2025, 6, 1),
        )
        .unwrap();
        assert_eq!(period.start, date(2024, 3, 10));
        assert_eq!(period.end, date(2024, 3, 10));
        assert_eq!(period.month, "2024-03");
    }

    #[test]
    fn test_partial_pair_is_rejected() {
        let only_start = resolve_period(None, Some(date(2024, 3, 10)), None, date(2025, 6, 1));
        assert!(matches!(only_start, Err(BillingError::InvalidPeriod(_))));

        let only_end = resolve_period(None, None, Some(date(2024, 3, 10)), date(2025, 6, 1));
        assert!(matches!(only_end, Err(BillingError::InvalidPeriod(_))));
    }

    #[test]
    fn test_no_input_defaults_to_current_month() {
        let period = resolve_period(None, None, None, date(2024, 5, 15)).unwrap();
        assert_eq!(period.start, date(2024, 5, 1));
        assert_eq!(period.end, date(2024, 5, 31));
        assert_eq!(period.month, "2024-05");
    }

    #[test]
    fn test_malformed_month_token_is_rejected() {
        for token in ["2024", "2024-13", "2024-00", "02-2024", "abcd-ef", ""] {
            let result = resolve_period(Some(token), None, None, date(2024, 5, 15));
            assert!(
                matches!(result, Err(BillingError::InvalidPeriod(_))),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_month_token_takes_precedence_over_pair() {
        let period = resolve_period(
            Some("2024-01"),
            Some(date(2024, 3, 10)),
            Some(date(2024, 3, 20)),
            date(2025, 6, 1),
        )
        .unwrap();
        assert_eq!(period.start, date(2024, 1, 1));
        assert_eq!(period.end, date(2024, 1, 31));
    }

    #[test]
    fn test_contains_date_is_inclusive() {
        let period = resolve_period(Some("2024-04"), None, None, date(2025, 6, 1)).unwrap();
        assert!(period.contains_date(date(2024, 4, 1)));
        assert!(period.contains_date(date(2024, 4, 30)));
        assert!(!period.contains_date(date(2024, 5, 1)));
        assert!(!period.contains_date(date(2024, 3, 31)));
    }
}
