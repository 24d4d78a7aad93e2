//! Delivery pricing and repricing decisions.
//!
//! The pricing engine snapshots a resolved price onto a delivery at creation
//! time and decides when a stored delivery must be re-priced. Prices are
//! snapshots: later rate changes never touch already-priced transactions.

pub mod engine;
pub mod error;

pub use engine::{needs_reprice, price_for_delivery, PriceSnapshot};
pub use error::PricingError;
