//! Error types for billing.

use thiserror::Error;

/// Error types for billing period resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// Malformed or partial billing period input.
    #[error("Invalid billing period: {0}")]
    InvalidPeriod(String),
}
