//! Property tests for the rate resolver.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::resolver::resolve;
use super::types::{DeliverySession, MilkType, RateCandidate, RateLookup};

fn session_strategy() -> impl Strategy<Value = Option<DeliverySession>> {
    prop_oneof![
        Just(None),
        Just(Some(DeliverySession::Morning)),
        Just(Some(DeliverySession::Evening)),
    ]
}

fn candidate_strategy(index: usize) -> impl Strategy<Value = RateCandidate> {
    (
        session_strategy(),
        1u32..=28u32,
        1i64..10000i64,
        prop::bool::weighted(0.9),
    )
        .prop_map(move |(session, day, price_cents, is_active)| RateCandidate {
            id: Uuid::new_v4(),
            session,
            price_per_unit: Decimal::new(price_cents, 2),
            effective_from: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            is_active,
            // Unique per candidate so the precedence tuple is a total order.
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::seconds(i64::try_from(index).unwrap_or(0)),
        })
}

fn candidates_strategy() -> impl Strategy<Value = Vec<RateCandidate>> {
    (1usize..8).prop_flat_map(|n| (0..n).map(candidate_strategy).collect::<Vec<_>>())
}

fn lookup_strategy() -> impl Strategy<Value = RateLookup> {
    (
        prop_oneof![Just(DeliverySession::Morning), Just(DeliverySession::Evening)],
        1u32..=28u32,
        1u32..=2u32,
    )
        .prop_map(|(session, day, month)| RateLookup {
            milk_type: MilkType::Cow,
            session,
            date: NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Resolving the same candidate set twice returns the same winner.
    #[test]
    fn prop_resolver_is_deterministic(
        candidates in candidates_strategy(),
        lookup in lookup_strategy(),
    ) {
        let first = resolve(&lookup, &candidates).map(|c| c.id);
        let second = resolve(&lookup, &candidates).map(|c| c.id);
        prop_assert_eq!(first, second);
    }

    /// Reordering the candidate set does not change the winner.
    #[test]
    fn prop_resolver_is_order_independent(
        candidates in candidates_strategy(),
        lookup in lookup_strategy(),
    ) {
        let forward = resolve(&lookup, &candidates).map(|c| c.id);

        let mut reversed = candidates.clone();
        reversed.reverse();
        let backward = resolve(&lookup, &reversed).map(|c| c.id);

        prop_assert_eq!(forward, backward);
    }

    /// The winner always applies to the lookup it was resolved for.
    #[test]
    fn prop_winner_applies_to_lookup(
        candidates in candidates_strategy(),
        lookup in lookup_strategy(),
    ) {
        if let Ok(winner) = resolve(&lookup, &candidates) {
            prop_assert!(winner.applies_to(&lookup));
        }
    }

    /// Whenever an applicable session-scoped candidate exists, the winner is
    /// session-scoped (a catch-all never shadows an exact match).
    #[test]
    fn prop_exact_session_precedence(
        candidates in candidates_strategy(),
        lookup in lookup_strategy(),
    ) {
        let has_exact = candidates
            .iter()
            .any(|c| c.applies_to(&lookup) && c.session == Some(lookup.session));

        if let Ok(winner) = resolve(&lookup, &candidates) {
            if has_exact {
                prop_assert_eq!(winner.session, Some(lookup.session));
            }
        }
    }
}
