//! `SeaORM` entity definitions.

pub mod milk_rates;
pub mod milk_transactions;
pub mod sea_orm_active_enums;
pub mod users;
