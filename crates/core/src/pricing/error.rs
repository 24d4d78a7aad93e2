//! Error types for delivery pricing.

use thiserror::Error;

use crate::rates::RateResolutionError;

/// Error types for the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// A delivered entry must carry a positive quantity.
    #[error("Quantity must be greater than 0 for delivered entries")]
    InvalidQuantity,

    /// No applicable rate for the delivery's key.
    #[error(transparent)]
    RateNotFound(#[from] RateResolutionError),
}
