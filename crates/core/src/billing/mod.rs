//! Billing period resolution and statement aggregation.

pub mod error;
pub mod period;
pub mod statement;

pub use error::BillingError;
pub use period::{resolve_period, BillingPeriod};
pub use statement::{summarize, BillingTotals};
