//! Statement aggregation over priced deliveries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate totals over a buyer's delivered transactions in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingTotals {
    /// Number of delivered entries.
    pub entries: u64,
    /// Summed quantity.
    pub total_quantity: Decimal,
    /// Summed total amount.
    pub total_amount: Decimal,
}

impl BillingTotals {
    /// Net payable after payments. No payment ledger exists yet, so
    /// payments-applied is always zero and this equals the total amount.
    #[must_use]
    pub fn net_payable(&self, payments_applied: Decimal) -> Decimal {
        self.total_amount - payments_applied
    }
}

/// Folds `(quantity, total_amount)` pairs into statement totals.
///
/// Callers are expected to pass delivered entries only; the fold itself does
/// not filter.
pub fn summarize<I>(rows: I) -> BillingTotals
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    rows.into_iter().fold(
        BillingTotals {
            entries: 0,
            total_quantity: Decimal::ZERO,
            total_amount: Decimal::ZERO,
        },
        |mut acc, (quantity, amount)| {
            acc.entries += 1;
            acc.total_quantity += quantity;
            acc.total_amount += amount;
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_summarize_empty() {
        let totals = summarize(std::iter::empty());
        assert_eq!(totals.entries, 0);
        assert_eq!(totals.total_quantity, Decimal::ZERO);
        assert_eq!(totals.total_amount, Decimal::ZERO);
        assert_eq!(totals.net_payable(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_summarize_folds_quantity_and_amount() {
        // 2 @ 50 and 3 @ 50; a cancelled entry never reaches the fold.
        let totals = summarize(vec![(dec!(2), dec!(100)), (dec!(3), dec!(150))]);
        assert_eq!(totals.entries, 2);
        assert_eq!(totals.total_quantity, dec!(5));
        assert_eq!(totals.total_amount, dec!(250));
        assert_eq!(totals.net_payable(Decimal::ZERO), dec!(250));
    }

    #[test]
    fn test_net_payable_subtracts_payments() {
        let totals = summarize(vec![(dec!(1), dec!(60))]);
        assert_eq!(totals.net_payable(dec!(10)), dec!(50));
    }
}
