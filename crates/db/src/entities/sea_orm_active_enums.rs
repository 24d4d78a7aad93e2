//! `SeaORM` active enums mapped to the Postgres enum types.
//!
//! The core crate carries its own copies of these enums so business logic
//! stays free of database dependencies; the `From` impls below convert at
//! the repository boundary.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role enum (`user_role`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Seller.
    #[sea_orm(string_value = "seller")]
    Seller,
    /// Buyer.
    #[sea_orm(string_value = "buyer")]
    Buyer,
}

/// Milk type enum (`milk_type`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "milk_type")]
#[serde(rename_all = "lowercase")]
pub enum MilkType {
    /// Cow milk.
    #[sea_orm(string_value = "cow")]
    Cow,
    /// Buffalo milk.
    #[sea_orm(string_value = "buffalo")]
    Buffalo,
}

/// Delivery session enum (`delivery_session`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "delivery_session")]
#[serde(rename_all = "lowercase")]
pub enum DeliverySession {
    /// Morning delivery window.
    #[sea_orm(string_value = "morning")]
    Morning,
    /// Evening delivery window.
    #[sea_orm(string_value = "evening")]
    Evening,
}

/// Transaction status enum (`transaction_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded but not yet handed over.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Milk was handed over.
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Cancelled entry.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<milkbook_core::rates::MilkType> for MilkType {
    fn from(value: milkbook_core::rates::MilkType) -> Self {
        match value {
            milkbook_core::rates::MilkType::Cow => Self::Cow,
            milkbook_core::rates::MilkType::Buffalo => Self::Buffalo,
        }
    }
}

impl From<MilkType> for milkbook_core::rates::MilkType {
    fn from(value: MilkType) -> Self {
        match value {
            MilkType::Cow => Self::Cow,
            MilkType::Buffalo => Self::Buffalo,
        }
    }
}

impl From<milkbook_core::rates::DeliverySession> for DeliverySession {
    fn from(value: milkbook_core::rates::DeliverySession) -> Self {
        match value {
            milkbook_core::rates::DeliverySession::Morning => Self::Morning,
            milkbook_core::rates::DeliverySession::Evening => Self::Evening,
        }
    }
}

impl From<DeliverySession> for milkbook_core::rates::DeliverySession {
    fn from(value: DeliverySession) -> Self {
        match value {
            DeliverySession::Morning => Self::Morning,
            DeliverySession::Evening => Self::Evening,
        }
    }
}

impl From<milkbook_core::ledger::TransactionStatus> for TransactionStatus {
    fn from(value: milkbook_core::ledger::TransactionStatus) -> Self {
        match value {
            milkbook_core::ledger::TransactionStatus::Pending => Self::Pending,
            milkbook_core::ledger::TransactionStatus::Delivered => Self::Delivered,
            milkbook_core::ledger::TransactionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<TransactionStatus> for milkbook_core::ledger::TransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Delivered => Self::Delivered,
            TransactionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<milkbook_core::auth::Role> for UserRole {
    fn from(value: milkbook_core::auth::Role) -> Self {
        match value {
            milkbook_core::auth::Role::Admin => Self::Admin,
            milkbook_core::auth::Role::Seller => Self::Seller,
            milkbook_core::auth::Role::Buyer => Self::Buyer,
        }
    }
}

impl From<UserRole> for milkbook_core::auth::Role {
    fn from(value: UserRole) -> Self {
        match value {
            UserRole::Admin => Self::Admin,
            UserRole::Seller => Self::Seller,
            UserRole::Buyer => Self::Buyer,
        }
    }
}
