//! Pure rate resolution with deterministic precedence.

use super::error::RateResolutionError;
use super::types::{RateCandidate, RateLookup};

/// Picks the single applicable rate out of a candidate set.
///
/// Precedence (first criterion wins, ties broken by the next):
/// 1. A rate scoped to the requested session beats a catch-all rate.
/// 2. A later `effective_from` beats an earlier one.
/// 3. A later `created_at` beats an earlier one (newest entry wins among
///    same-day rates).
///
/// Reversing (2) and (3) changes historical pricing results; the order is
/// load-bearing.
///
/// Candidates that do not apply (inactive, future-dated, or scoped to a
/// different session) are ignored, so the function is total over any input
/// slice and independent of its ordering.
///
/// # Errors
///
/// Returns [`RateResolutionError::NotFound`] carrying the full lookup key
/// when no candidate applies.
pub fn resolve<'a>(
    lookup: &RateLookup,
    candidates: &'a [RateCandidate],
) -> Result<&'a RateCandidate, RateResolutionError> {
    candidates
        .iter()
        .filter(|c| c.applies_to(lookup))
        .max_by_key(|c| {
            (
                c.session == Some(lookup.session),
                c.effective_from,
                c.created_at,
            )
        })
        .ok_or(RateResolutionError::NotFound {
            milk_type: lookup.milk_type,
            session: lookup.session,
            date: lookup.date,
        })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::rates::types::{DeliverySession, MilkType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(
        session: Option<DeliverySession>,
        effective_from: NaiveDate,
        created_day: u32,
        price: rust_decimal::Decimal,
    ) -> RateCandidate {
        RateCandidate {
            id: Uuid::new_v4(),
            session,
            price_per_unit: price,
            effective_from,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, created_day, 8, 0, 0).unwrap(),
        }
    }

    fn lookup(session: DeliverySession, on: NaiveDate) -> RateLookup {
        RateLookup {
            milk_type: MilkType::Cow,
            session,
            date: on,
        }
    }

    #[test]
    fn test_exact_session_beats_later_catch_all() {
        // Evening-specific rate from Jan 1 vs catch-all from Jan 5:
        // the session match outranks the later effective date.
        let candidates = vec![
            candidate(Some(DeliverySession::Evening), date(2024, 1, 1), 1, dec!(50)),
            candidate(None, date(2024, 1, 5), 5, dec!(60)),
        ];

        let winner = resolve(
            &lookup(DeliverySession::Evening, date(2024, 1, 10)),
            &candidates,
        )
        .unwrap();
        assert_eq!(winner.session, Some(DeliverySession::Evening));
        assert_eq!(winner.price_per_unit, dec!(50));
    }

    #[test]
    fn test_later_effective_date_wins_among_catch_alls() {
        let candidates = vec![
            candidate(None, date(2024, 1, 1), 1, dec!(45)),
            candidate(None, date(2024, 1, 5), 5, dec!(48)),
        ];

        let winner = resolve(
            &lookup(DeliverySession::Morning, date(2024, 1, 10)),
            &candidates,
        )
        .unwrap();
        assert_eq!(winner.effective_from, date(2024, 1, 5));
        assert_eq!(winner.price_per_unit, dec!(48));
    }

    #[test]
    fn test_later_created_at_wins_same_day() {
        // Same effective_from, one session-scoped and one catch-all would
        // differ on criterion 1, so use two catch-alls created on different
        // days to isolate criterion 3.
        let older = candidate(None, date(2024, 1, 1), 2, dec!(40));
        let newer = candidate(None, date(2024, 1, 1), 9, dec!(42));
        let candidates = vec![older, newer.clone()];

        let winner = resolve(
            &lookup(DeliverySession::Morning, date(2024, 1, 10)),
            &candidates,
        )
        .unwrap();
        assert_eq!(winner.id, newer.id);
    }

    #[test]
    fn test_future_rates_are_ignored() {
        let candidates = vec![candidate(None, date(2024, 2, 1), 1, dec!(99))];

        let result = resolve(
            &lookup(DeliverySession::Morning, date(2024, 1, 10)),
            &candidates,
        );
        assert!(matches!(
            result,
            Err(RateResolutionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_inactive_rates_are_ignored() {
        let mut inactive = candidate(None, date(2024, 1, 1), 1, dec!(99));
        inactive.is_active = false;
        let candidates = vec![inactive];

        let result = resolve(
            &lookup(DeliverySession::Morning, date(2024, 1, 10)),
            &candidates,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_other_session_rate_does_not_apply() {
        let candidates = vec![candidate(
            Some(DeliverySession::Evening),
            date(2024, 1, 1),
            1,
            dec!(55),
        )];

        let result = resolve(
            &lookup(DeliverySession::Morning, date(2024, 1, 10)),
            &candidates,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_candidates_carry_lookup_key() {
        let result = resolve(&lookup(DeliverySession::Evening, date(2024, 3, 15)), &[]);

        let Err(RateResolutionError::NotFound {
            milk_type,
            session,
            date: failed_on,
        }) = result
        else {
            panic!("expected NotFound");
        };
        assert_eq!(milk_type, MilkType::Cow);
        assert_eq!(session, DeliverySession::Evening);
        assert_eq!(failed_on, date(2024, 3, 15));
    }

    #[test]
    fn test_rate_effective_today_applies_today() {
        let candidates = vec![candidate(None, date(2024, 1, 10), 1, dec!(47))];

        let winner = resolve(
            &lookup(DeliverySession::Morning, date(2024, 1, 10)),
            &candidates,
        )
        .unwrap();
        assert_eq!(winner.price_per_unit, dec!(47));
    }

    #[test]
    fn test_round_trip_exact_key() {
        // A freshly created rate resolves for its exact key and date, even
        // with older competitors present.
        let created = candidate(Some(DeliverySession::Morning), date(2024, 1, 10), 9, dec!(53));
        let candidates = vec![
            candidate(Some(DeliverySession::Morning), date(2024, 1, 1), 1, dec!(49)),
            candidate(None, date(2024, 1, 10), 2, dec!(51)),
            created.clone(),
        ];

        let winner = resolve(
            &lookup(DeliverySession::Morning, date(2024, 1, 10)),
            &candidates,
        )
        .unwrap();
        assert_eq!(winner.id, created.id);
        assert_eq!(winner.price_per_unit, dec!(53));
    }
}
