//! Delivery transaction status domain.

pub mod types;

pub use types::{TransactionChanges, TransactionStatus};
