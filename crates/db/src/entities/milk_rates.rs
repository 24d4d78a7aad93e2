//! `SeaORM` Entity for the milk_rates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DeliverySession, MilkType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "milk_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub milk_type: MilkType,
    /// `None` means the rate applies to any session (legacy catch-all rows).
    pub delivery_session: Option<DeliverySession>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price_per_unit: Decimal,
    pub effective_from: Date,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
