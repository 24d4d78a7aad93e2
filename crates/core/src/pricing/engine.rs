//! Pricing engine decision logic.

use rust_decimal::Decimal;

use super::error::PricingError;
use crate::ledger::{TransactionChanges, TransactionStatus};
use crate::rates::{resolve, RateCandidate, RateLookup};

/// The price stored on a transaction at the time it was priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSnapshot {
    /// Resolved price per unit.
    pub price_per_unit: Decimal,
    /// `quantity * price_per_unit`, rounded to 2 decimal places.
    pub total_amount: Decimal,
}

impl PriceSnapshot {
    /// The forced snapshot for entries that are not delivered.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            price_per_unit: Decimal::ZERO,
            total_amount: Decimal::ZERO,
        }
    }
}

/// Prices a delivery against a resolved rate.
///
/// Non-delivered entries are never priced: the snapshot is forced to zero
/// without consulting the resolver. Delivered entries must carry a positive
/// quantity and an applicable rate.
///
/// # Errors
///
/// Returns [`PricingError::InvalidQuantity`] for a delivered entry with a
/// non-positive quantity, and propagates the resolver's `RateNotFound`
/// unchanged — a delivery is never stored unpriced.
pub fn price_for_delivery(
    status: TransactionStatus,
    lookup: &RateLookup,
    quantity: Decimal,
    candidates: &[RateCandidate],
) -> Result<PriceSnapshot, PricingError> {
    if !status.is_delivered() {
        return Ok(PriceSnapshot::zero());
    }

    if quantity <= Decimal::ZERO {
        return Err(PricingError::InvalidQuantity);
    }

    let rate = resolve(lookup, candidates)?;
    Ok(PriceSnapshot {
        price_per_unit: rate.price_per_unit,
        total_amount: (quantity * rate.price_per_unit).round_dp(2),
    })
}

/// Decides whether a stored transaction must be re-priced after an update.
///
/// Triggers when the cached price is absent or non-positive, or when the
/// patch supplied milk type, session, status, or date. A date change forces
/// repricing because the delivery date determines which rate applies; a
/// quantity-only change recomputes the total from the cached price without a
/// resolver call.
#[must_use]
pub fn needs_reprice(cached_price: Option<Decimal>, changes: &TransactionChanges) -> bool {
    cached_price.unwrap_or(Decimal::ZERO) <= Decimal::ZERO || changes.touches_pricing()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::rates::{DeliverySession, MilkType, RateResolutionError};

    fn lookup() -> RateLookup {
        RateLookup {
            milk_type: MilkType::Cow,
            session: DeliverySession::Morning,
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        }
    }

    fn one_candidate(price: Decimal) -> Vec<RateCandidate> {
        vec![RateCandidate {
            id: Uuid::new_v4(),
            session: Some(DeliverySession::Morning),
            price_per_unit: price,
            effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap(),
        }]
    }

    #[test]
    fn test_delivered_entry_is_priced() {
        let snapshot = price_for_delivery(
            TransactionStatus::Delivered,
            &lookup(),
            dec!(2.5),
            &one_candidate(dec!(50)),
        )
        .unwrap();

        assert_eq!(snapshot.price_per_unit, dec!(50));
        assert_eq!(snapshot.total_amount, dec!(125.00));
    }

    #[rstest]
    #[case(TransactionStatus::Pending)]
    #[case(TransactionStatus::Cancelled)]
    fn test_non_delivered_entry_is_forced_to_zero(#[case] status: TransactionStatus) {
        // No candidates on purpose: the resolver must not be consulted.
        let snapshot = price_for_delivery(status, &lookup(), dec!(5), &[]).unwrap();
        assert_eq!(snapshot, PriceSnapshot::zero());
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    fn test_delivered_entry_rejects_non_positive_quantity(#[case] quantity: Decimal) {
        let result = price_for_delivery(
            TransactionStatus::Delivered,
            &lookup(),
            quantity,
            &one_candidate(dec!(50)),
        );
        assert_eq!(result, Err(PricingError::InvalidQuantity));
    }

    #[test]
    fn test_missing_rate_propagates() {
        let result =
            price_for_delivery(TransactionStatus::Delivered, &lookup(), dec!(1), &[]);
        assert!(matches!(
            result,
            Err(PricingError::RateNotFound(RateResolutionError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_total_is_rounded_to_two_decimals() {
        let snapshot = price_for_delivery(
            TransactionStatus::Delivered,
            &lookup(),
            dec!(1.33),
            &one_candidate(dec!(52.55)),
        )
        .unwrap();

        // 1.33 * 52.55 = 69.8915 -> 69.89
        assert_eq!(snapshot.total_amount, dec!(69.89));
    }

    #[test]
    fn test_reprice_when_cached_price_missing_or_zero() {
        let unchanged = TransactionChanges::default();
        assert!(needs_reprice(None, &unchanged));
        assert!(needs_reprice(Some(dec!(0)), &unchanged));
        assert!(needs_reprice(Some(dec!(-5)), &unchanged));
    }

    #[rstest]
    #[case(TransactionChanges { milk_type: true, ..Default::default() })]
    #[case(TransactionChanges { session: true, ..Default::default() })]
    #[case(TransactionChanges { status: true, ..Default::default() })]
    #[case(TransactionChanges { date: true, ..Default::default() })]
    fn test_reprice_on_pricing_relevant_change(#[case] changes: TransactionChanges) {
        assert!(needs_reprice(Some(dec!(50)), &changes));
    }

    #[test]
    fn test_no_reprice_when_price_cached_and_nothing_relevant_changed() {
        // Pricing idempotence: a quantity- or remarks-only patch with a
        // positive cached price leaves the snapshot alone.
        let unchanged = TransactionChanges::default();
        assert!(!needs_reprice(Some(dec!(50)), &unchanged));
    }
}
