//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Business decisions (rate precedence, pricing, billing
//! folds) are delegated to `milkbook-core`; repositories orchestrate them
//! around queries.

pub mod milk_rate;
pub mod milk_transaction;
pub mod user;

pub use milk_rate::{CreateRateInput, RateError, RateFilter, RateRepository, UpdateRateInput};
pub use milk_transaction::{
    BuyerBillingStatement, CreateTransactionInput, PartyStats, SellerStatsRow, TransactionError,
    TransactionFilter, TransactionRepository, UpdateTransactionInput,
};
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserFilter, UserRepository};
