//! Rate schedule domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milk type a rate or delivery refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilkType {
    /// Cow milk.
    Cow,
    /// Buffalo milk.
    Buffalo,
}

impl std::fmt::Display for MilkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cow => write!(f, "cow"),
            Self::Buffalo => write!(f, "buffalo"),
        }
    }
}

impl std::str::FromStr for MilkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cow" => Ok(Self::Cow),
            "buffalo" => Ok(Self::Buffalo),
            _ => Err(format!("Unknown milk type: {s}")),
        }
    }
}

/// Morning or evening delivery window.
///
/// A rate row without a session applies regardless of session; that case is
/// modelled as `Option<DeliverySession>::None` on the rate, never as an enum
/// variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliverySession {
    /// Morning delivery window.
    Morning,
    /// Evening delivery window.
    Evening,
}

impl std::fmt::Display for DeliverySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Evening => write!(f, "evening"),
        }
    }
}

impl std::str::FromStr for DeliverySession {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "evening" => Ok(Self::Evening),
            _ => Err(format!("Unknown delivery session: {s}")),
        }
    }
}

/// The key a rate lookup is performed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLookup {
    /// Milk type of the delivery.
    pub milk_type: MilkType,
    /// Session of the delivery.
    pub session: DeliverySession,
    /// Delivery date (date-only; callers strip any time component).
    pub date: NaiveDate,
}

/// A rate row under consideration by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateCandidate {
    /// Rate row id.
    pub id: Uuid,
    /// Session this rate is scoped to; `None` applies to any session.
    pub session: Option<DeliverySession>,
    /// Price per unit.
    pub price_per_unit: Decimal,
    /// First date this rate applies.
    pub effective_from: NaiveDate,
    /// Inactive rates never win.
    pub is_active: bool,
    /// Creation timestamp; breaks ties among same-day rates.
    pub created_at: DateTime<Utc>,
}

impl RateCandidate {
    /// Returns true if this rate can price the given lookup.
    #[must_use]
    pub fn applies_to(&self, lookup: &RateLookup) -> bool {
        self.is_active
            && self.effective_from <= lookup.date
            && self.session.map_or(true, |s| s == lookup.session)
    }
}
