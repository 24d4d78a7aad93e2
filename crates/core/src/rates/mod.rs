//! The rate schedule domain and the rate resolver.
//!
//! A rate is a priced rule valid from a given date for a milk type and
//! optionally a specific delivery session. The resolver picks the single
//! applicable rate for a delivery with deterministic tie-breaking.

pub mod error;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod props;

pub use error::RateResolutionError;
pub use resolver::resolve;
pub use types::{DeliverySession, MilkType, RateCandidate, RateLookup};
