//! Delivery transaction types.

use serde::{Deserialize, Serialize};

/// Status of a delivery transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded but not yet handed over.
    Pending,
    /// Milk was handed over; the entry is priced and billed.
    Delivered,
    /// Cancelled entry; carries no quantity or price.
    Cancelled,
}

impl TransactionStatus {
    /// Returns true if entries in this status are priced and billed.
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown transaction status: {s}")),
        }
    }
}

/// Which pricing-relevant fields an update actually supplied.
///
/// The repricing decision only looks at which fields were part of the patch,
/// not at whether their values differ from the stored row; re-submitting the
/// same status is treated as a pricing-relevant change, matching the write
/// path's observable behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionChanges {
    /// The patch supplied a milk type.
    pub milk_type: bool,
    /// The patch supplied a delivery session.
    pub session: bool,
    /// The patch supplied a status.
    pub status: bool,
    /// The patch supplied a delivery date.
    pub date: bool,
}

impl TransactionChanges {
    /// Returns true if any field that feeds rate resolution was supplied.
    #[must_use]
    pub fn touches_pricing(&self) -> bool {
        self.milk_type || self.session || self.status || self.date
    }
}
