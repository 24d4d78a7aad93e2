//! Error types for rate resolution.

use chrono::NaiveDate;
use thiserror::Error;

use super::types::{DeliverySession, MilkType};

/// Error types for the rate resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateResolutionError {
    /// No applicable rate exists for the requested key. This is a business
    /// data gap (nobody configured a rate), not a system fault.
    #[error(
        "No active milk rate configured for milkType={milk_type}, session={session}, date={date}"
    )]
    NotFound {
        /// Milk type of the failed lookup.
        milk_type: MilkType,
        /// Session of the failed lookup.
        session: DeliverySession,
        /// Delivery date of the failed lookup.
        date: NaiveDate,
    },
}
