//! `SeaORM` Entity for the milk_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DeliverySession, MilkType, TransactionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "milk_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    pub date: Date,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub quantity: Decimal,
    /// Unit token, "L" or "kg".
    pub unit: String,
    pub status: TransactionStatus,
    pub delivery_session: DeliverySession,
    pub milk_type: MilkType,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    /// Price snapshot taken when the entry was last priced.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub price_per_unit: Option<Decimal>,
    /// `quantity * price_per_unit` snapshot.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub total_amount: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SellerId",
        to = "super::users::Column::Id"
    )]
    Seller,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::BuyerId",
        to = "super::users::Column::Id"
    )]
    Buyer,
}

impl ActiveModelBehavior for ActiveModel {}
