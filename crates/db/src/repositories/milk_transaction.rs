//! Milk transaction repository - the delivery ledger.
//!
//! Owns the `milk_transactions` table: the status machine, quantity, and the
//! cached price snapshot. Pricing decisions are delegated to
//! `milkbook_core::pricing`; this repository feeds the engine with rate
//! candidates and persists the resulting snapshot. Billing statements and
//! seller/buyer statistics are read-side projections recomputed per request.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use milkbook_core::billing::{summarize, BillingPeriod};
use milkbook_core::ledger::{TransactionChanges, TransactionStatus};
use milkbook_core::pricing::{needs_reprice, price_for_delivery, PriceSnapshot, PricingError};
use milkbook_core::rates::{DeliverySession, MilkType, RateLookup};
use milkbook_shared::NotificationService;

use crate::entities::{milk_transactions, sea_orm_active_enums, users};
use crate::repositories::milk_rate::{RateError, RateRepository};

/// Error types for transaction ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Seller id is unknown.
    #[error("Seller not found: {0}")]
    SellerNotFound(Uuid),

    /// Buyer id is unknown.
    #[error("Buyer not found: {0}")]
    BuyerNotFound(Uuid),

    /// Pricing failed (missing rate or invalid quantity).
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<RateError> for TransactionError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Resolution(e) => Self::Pricing(PricingError::RateNotFound(e)),
            RateError::Database(e) => Self::Database(e),
            // Rate candidate queries cannot produce the remaining variants.
            other => Self::Database(DbErr::Custom(other.to_string())),
        }
    }
}

/// Input for recording a delivery.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Buyer receiving the delivery.
    pub buyer_id: Uuid,
    /// Delivery date.
    pub date: NaiveDate,
    /// Delivered quantity.
    pub quantity: Decimal,
    /// Unit token; defaults to "L".
    pub unit: Option<String>,
    /// Status; defaults to delivered.
    pub status: Option<TransactionStatus>,
    /// Session; defaults to morning.
    pub delivery_session: Option<DeliverySession>,
    /// Milk type; defaults to cow.
    pub milk_type: Option<MilkType>,
    /// Free-form remarks.
    pub remarks: Option<String>,
}

/// Partial update for a transaction. The session-alias merge happens at the
/// API boundary; patches arriving here are alias-free.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New quantity.
    pub quantity: Option<Decimal>,
    /// New status.
    pub status: Option<TransactionStatus>,
    /// New delivery date.
    pub date: Option<NaiveDate>,
    /// New session.
    pub delivery_session: Option<DeliverySession>,
    /// New milk type.
    pub milk_type: Option<MilkType>,
    /// New unit token.
    pub unit: Option<String>,
    /// New remarks.
    pub remarks: Option<String>,
}

/// Filter options for listing transactions. Filters combine conjunctively.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by seller.
    pub seller_id: Option<Uuid>,
    /// Filter by buyer.
    pub buyer_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<TransactionStatus>,
    /// Date range start (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Date range end (inclusive).
    pub end_date: Option<NaiveDate>,
}

/// Aggregated statistics for one seller or buyer over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct PartyStats {
    /// Number of matching transactions.
    pub total_transactions: u64,
    /// Summed quantity across all entries.
    pub total_quantity: Decimal,
    /// Summed quantity of entries with unit "L".
    pub total_liters: Decimal,
    /// Summed quantity of entries with unit "kg".
    pub total_kg: Decimal,
    /// Summed total amount.
    pub total_amount: Decimal,
    /// Number of delivered entries.
    pub delivered_count: u64,
    /// The matching transactions.
    pub transactions: Vec<milk_transactions::Model>,
}

/// Per-seller aggregation row for the administrative dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SellerStatsRow {
    /// Seller id.
    pub seller_id: Uuid,
    /// Seller display name.
    pub seller_name: String,
    /// Seller mobile number.
    pub seller_mobile: String,
    /// Number of matching transactions.
    pub total_transactions: u64,
    /// Summed quantity.
    pub total_quantity: Decimal,
    /// Summed quantity of entries with unit "L".
    pub total_liters: Decimal,
    /// Summed quantity of entries with unit "kg".
    pub total_kg: Decimal,
    /// Summed total amount.
    pub total_amount: Decimal,
    /// Number of delivered entries.
    pub delivered_count: u64,
}

/// A buyer's billing statement for a resolved period. Derived, never
/// persisted; recomputed on every request.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerBillingStatement {
    /// Buyer id.
    pub buyer_id: Uuid,
    /// Period token (`YYYY-MM`).
    pub month: String,
    /// Period start (inclusive).
    pub period_start: NaiveDate,
    /// Period end (inclusive).
    pub period_end: NaiveDate,
    /// Number of delivered entries in the period.
    pub total_delivered_entries: u64,
    /// Summed quantity.
    pub total_quantity: Decimal,
    /// Summed amount.
    pub total_amount: Decimal,
    /// Payments applied against the period. No payment ledger exists yet;
    /// always zero.
    pub payments_applied: Decimal,
    /// `total_amount - payments_applied`.
    pub net_payable: Decimal,
    /// The underlying delivered transactions, date descending.
    pub transactions: Vec<milk_transactions::Model>,
}

/// Milk transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    rates: RateRepository,
    notifier: NotificationService,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, notifier: NotificationService) -> Self {
        let rates = RateRepository::new(db.clone());
        Self {
            db,
            rates,
            notifier,
        }
    }

    /// Records a delivery. Optional fields are normalized (unit "L", session
    /// morning, milk type cow, status delivered), the price snapshot is
    /// resolved through the rate schedule, and - only when the final status
    /// is delivered with a positive quantity - a delivery notification is
    /// fired without awaiting its outcome.
    ///
    /// # Errors
    ///
    /// Returns `SellerNotFound`/`BuyerNotFound` for unknown parties and
    /// propagates pricing failures; a delivery is never stored unpriced.
    pub async fn create(
        &self,
        seller_id: Uuid,
        input: CreateTransactionInput,
    ) -> Result<milk_transactions::Model, TransactionError> {
        self.ensure_user_exists(seller_id, TransactionError::SellerNotFound(seller_id))
            .await?;
        self.ensure_user_exists(input.buyer_id, TransactionError::BuyerNotFound(input.buyer_id))
            .await?;

        let status = input.status.unwrap_or(TransactionStatus::Delivered);
        let session = input.delivery_session.unwrap_or(DeliverySession::Morning);
        let milk_type = input.milk_type.unwrap_or(MilkType::Cow);
        let unit = input.unit.unwrap_or_else(|| "L".to_string());
        let quantity = if status.is_delivered() {
            input.quantity
        } else {
            Decimal::ZERO
        };

        let snapshot = self
            .price_snapshot(status, milk_type, session, input.date, quantity)
            .await?;

        let now = Utc::now().into();
        let transaction = milk_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            seller_id: Set(seller_id),
            buyer_id: Set(input.buyer_id),
            date: Set(input.date),
            quantity: Set(quantity),
            unit: Set(unit),
            status: Set(status.into()),
            delivery_session: Set(session.into()),
            milk_type: Set(milk_type.into()),
            remarks: Set(input.remarks),
            price_per_unit: Set(Some(snapshot.price_per_unit)),
            total_amount: Set(Some(snapshot.total_amount)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = transaction.insert(&self.db).await?;

        if status.is_delivered() && quantity > Decimal::ZERO {
            let notifier = self.notifier.clone();
            let buyer_id = input.buyer_id;
            tokio::spawn(async move {
                notifier.notify_delivery(seller_id, buyer_id, quantity).await;
            });
        }

        info!(transaction_id = %saved.id, seller_id = %seller_id, "delivery recorded");
        Ok(saved)
    }

    /// Applies a patch to a transaction and re-prices it when needed.
    ///
    /// Moving away from delivered forces quantity, price, and total to zero
    /// without a resolver call. A still-delivered entry must carry a
    /// positive quantity; its price is re-resolved when the cached price is
    /// non-positive or when milk type, session, status, or date was part of
    /// the patch, and the total is recomputed from quantity x price either
    /// way.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotFound`] if the id is absent and
    /// propagates pricing failures.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateTransactionInput,
    ) -> Result<milk_transactions::Model, TransactionError> {
        let current = self.find_by_id(id).await?;

        let changes = TransactionChanges {
            milk_type: patch.milk_type.is_some(),
            session: patch.delivery_session.is_some(),
            status: patch.status.is_some(),
            date: patch.date.is_some(),
        };

        let status = patch
            .status
            .unwrap_or_else(|| current.status.clone().into());
        let session = patch
            .delivery_session
            .unwrap_or_else(|| current.delivery_session.clone().into());
        let milk_type = patch
            .milk_type
            .unwrap_or_else(|| current.milk_type.clone().into());
        let date = patch.date.unwrap_or(current.date);
        let cached_price = current.price_per_unit;
        let current_quantity = current.quantity;

        let mut active: milk_transactions::ActiveModel = current.into();
        active.status = Set(status.into());
        active.delivery_session = Set(session.into());
        active.milk_type = Set(milk_type.into());
        active.date = Set(date);
        if let Some(unit) = patch.unit {
            active.unit = Set(unit);
        }
        if let Some(remarks) = patch.remarks {
            active.remarks = Set(Some(remarks));
        }

        if !status.is_delivered() {
            active.quantity = Set(Decimal::ZERO);
            active.price_per_unit = Set(Some(Decimal::ZERO));
            active.total_amount = Set(Some(Decimal::ZERO));
            return Ok(active.update(&self.db).await?);
        }

        let quantity = patch.quantity.unwrap_or(current_quantity);
        if quantity <= Decimal::ZERO {
            return Err(TransactionError::Pricing(PricingError::InvalidQuantity));
        }
        active.quantity = Set(quantity);

        let price_per_unit = if needs_reprice(cached_price, &changes) {
            let snapshot = self
                .price_snapshot(status, milk_type, session, date, quantity)
                .await?;
            snapshot.price_per_unit
        } else {
            cached_price.unwrap_or(Decimal::ZERO)
        };

        active.price_per_unit = Set(Some(price_per_unit));
        active.total_amount = Set(Some((quantity * price_per_unit).round_dp(2)));

        Ok(active.update(&self.db).await?)
    }

    /// Hard-deletes a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotFound`] if no row was affected.
    pub async fn delete(&self, id: Uuid) -> Result<(), TransactionError> {
        let result = milk_transactions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TransactionError::NotFound(id));
        }
        Ok(())
    }

    /// Finds a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotFound`] if the id is absent.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<milk_transactions::Model, TransactionError> {
        milk_transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))
    }

    /// Lists transactions matching the filter, date descending.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn query(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<milk_transactions::Model>, TransactionError> {
        Ok(self.filtered_query(&filter).all(&self.db).await?)
    }

    /// Aggregated statistics for one seller over a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn seller_stats(
        &self,
        seller_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PartyStats, TransactionError> {
        let filter = TransactionFilter {
            seller_id: Some(seller_id),
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        };
        let transactions = self.query(filter).await?;
        Ok(fold_party_stats(transactions))
    }

    /// Aggregated statistics for one buyer over a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn buyer_stats(
        &self,
        buyer_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PartyStats, TransactionError> {
        let filter = TransactionFilter {
            buyer_id: Some(buyer_id),
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        };
        let transactions = self.query(filter).await?;
        Ok(fold_party_stats(transactions))
    }

    /// Per-seller aggregation joined to seller display identity, ordered by
    /// total quantity descending. Open-ended date bounds are honored.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn all_sellers_stats(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        status: Option<TransactionStatus>,
    ) -> Result<Vec<SellerStatsRow>, TransactionError> {
        let filter = TransactionFilter {
            status,
            start_date,
            end_date,
            ..Default::default()
        };
        let transactions = self.query(filter).await?;

        let mut by_seller: HashMap<Uuid, PartyStats> = HashMap::new();
        for transaction in transactions {
            let entry = by_seller
                .entry(transaction.seller_id)
                .or_insert_with(empty_party_stats);
            accumulate(entry, &transaction);
        }

        if by_seller.is_empty() {
            return Ok(Vec::new());
        }

        let seller_ids: Vec<Uuid> = by_seller.keys().copied().collect();
        let sellers = users::Entity::find()
            .filter(users::Column::Id.is_in(seller_ids))
            .all(&self.db)
            .await?;
        let identities: HashMap<Uuid, (String, String)> = sellers
            .into_iter()
            .map(|u| (u.id, (u.name, u.mobile)))
            .collect();

        let mut rows: Vec<SellerStatsRow> = by_seller
            .into_iter()
            .map(|(seller_id, stats)| {
                let (seller_name, seller_mobile) = identities
                    .get(&seller_id)
                    .cloned()
                    .unwrap_or_else(|| (String::new(), String::new()));
                SellerStatsRow {
                    seller_id,
                    seller_name,
                    seller_mobile,
                    total_transactions: stats.total_transactions,
                    total_quantity: stats.total_quantity,
                    total_liters: stats.total_liters,
                    total_kg: stats.total_kg,
                    total_amount: stats.total_amount,
                    delivered_count: stats.delivered_count,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
        Ok(rows)
    }

    /// A buyer's billing statement over a resolved period: delivered-only
    /// entries with date inside the period, date descending.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn buyer_billing(
        &self,
        buyer_id: Uuid,
        period: &BillingPeriod,
    ) -> Result<BuyerBillingStatement, TransactionError> {
        let filter = TransactionFilter {
            buyer_id: Some(buyer_id),
            status: Some(TransactionStatus::Delivered),
            start_date: Some(period.start),
            end_date: Some(period.end),
            ..Default::default()
        };
        let transactions = self.query(filter).await?;

        let totals = summarize(
            transactions
                .iter()
                .map(|t| (t.quantity, t.total_amount.unwrap_or(Decimal::ZERO))),
        );
        let payments_applied = Decimal::ZERO;

        Ok(BuyerBillingStatement {
            buyer_id,
            month: period.month.clone(),
            period_start: period.start,
            period_end: period.end,
            total_delivered_entries: totals.entries,
            total_quantity: totals.total_quantity,
            total_amount: totals.total_amount,
            payments_applied,
            net_payable: totals.net_payable(payments_applied),
            transactions,
        })
    }

    async fn ensure_user_exists(
        &self,
        id: Uuid,
        missing: TransactionError,
    ) -> Result<(), TransactionError> {
        let found = users::Entity::find_by_id(id).one(&self.db).await?;
        if found.is_none() {
            return Err(missing);
        }
        Ok(())
    }

    /// Resolves a price snapshot through the rate schedule.
    async fn price_snapshot(
        &self,
        status: TransactionStatus,
        milk_type: MilkType,
        session: DeliverySession,
        date: NaiveDate,
        quantity: Decimal,
    ) -> Result<PriceSnapshot, TransactionError> {
        if !status.is_delivered() {
            return Ok(PriceSnapshot::zero());
        }

        let candidates = self.rates.candidates_for(milk_type, session, date).await?;
        let lookup = RateLookup {
            milk_type,
            session,
            date,
        };
        Ok(price_for_delivery(status, &lookup, quantity, &candidates)?)
    }

    fn filtered_query(&self, filter: &TransactionFilter) -> sea_orm::Select<milk_transactions::Entity> {
        let mut query = milk_transactions::Entity::find()
            .order_by_desc(milk_transactions::Column::Date);

        if let Some(seller_id) = filter.seller_id {
            query = query.filter(milk_transactions::Column::SellerId.eq(seller_id));
        }
        if let Some(buyer_id) = filter.buyer_id {
            query = query.filter(milk_transactions::Column::BuyerId.eq(buyer_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(
                milk_transactions::Column::Status
                    .eq(sea_orm_active_enums::TransactionStatus::from(status)),
            );
        }
        if let Some(start) = filter.start_date {
            query = query.filter(milk_transactions::Column::Date.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(milk_transactions::Column::Date.lte(end));
        }

        query
    }
}

fn empty_party_stats() -> PartyStats {
    PartyStats {
        total_transactions: 0,
        total_quantity: Decimal::ZERO,
        total_liters: Decimal::ZERO,
        total_kg: Decimal::ZERO,
        total_amount: Decimal::ZERO,
        delivered_count: 0,
        transactions: Vec::new(),
    }
}

fn accumulate(stats: &mut PartyStats, transaction: &milk_transactions::Model) {
    stats.total_transactions += 1;
    stats.total_quantity += transaction.quantity;
    match transaction.unit.as_str() {
        "L" => stats.total_liters += transaction.quantity,
        "kg" => stats.total_kg += transaction.quantity,
        _ => {}
    }
    stats.total_amount += transaction.total_amount.unwrap_or(Decimal::ZERO);
    if transaction.status == sea_orm_active_enums::TransactionStatus::Delivered {
        stats.delivered_count += 1;
    }
}

fn fold_party_stats(transactions: Vec<milk_transactions::Model>) -> PartyStats {
    let mut stats = empty_party_stats();
    for transaction in &transactions {
        accumulate(&mut stats, transaction);
    }
    stats.transactions = transactions;
    stats
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::entities::sea_orm_active_enums::{
        DeliverySession as DbSession, MilkType as DbMilkType, TransactionStatus as DbStatus,
    };

    fn model(
        unit: &str,
        quantity: Decimal,
        amount: Option<Decimal>,
        status: DbStatus,
    ) -> milk_transactions::Model {
        let created = chrono::Utc
            .with_ymd_and_hms(2024, 1, 1, 6, 0, 0)
            .unwrap()
            .fixed_offset();
        milk_transactions::Model {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            quantity,
            unit: unit.to_string(),
            status,
            delivery_session: DbSession::Morning,
            milk_type: DbMilkType::Cow,
            remarks: None,
            price_per_unit: Some(dec!(50)),
            total_amount: amount,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_fold_party_stats_buckets_by_unit() {
        let stats = fold_party_stats(vec![
            model("L", dec!(2), Some(dec!(100)), DbStatus::Delivered),
            model("kg", dec!(3), Some(dec!(150)), DbStatus::Delivered),
            model("L", dec!(1.5), Some(dec!(75)), DbStatus::Pending),
        ]);

        assert_eq!(stats.total_transactions, 3);
        assert_eq!(stats.total_quantity, dec!(6.5));
        assert_eq!(stats.total_liters, dec!(3.5));
        assert_eq!(stats.total_kg, dec!(3));
        assert_eq!(stats.total_amount, dec!(325));
        assert_eq!(stats.delivered_count, 2);
        assert_eq!(stats.transactions.len(), 3);
    }

    #[test]
    fn test_fold_party_stats_missing_amounts_count_as_zero() {
        let stats = fold_party_stats(vec![
            model("L", dec!(2), None, DbStatus::Delivered),
            model("L", dec!(1), Some(dec!(50)), DbStatus::Delivered),
        ]);

        assert_eq!(stats.total_amount, dec!(50));
        assert_eq!(stats.delivered_count, 2);
    }

    #[test]
    fn test_fold_party_stats_unknown_unit_still_counts_overall() {
        let stats = fold_party_stats(vec![model(
            "gal",
            dec!(4),
            Some(dec!(10)),
            DbStatus::Delivered,
        )]);

        assert_eq!(stats.total_quantity, dec!(4));
        assert_eq!(stats.total_liters, dec!(0));
        assert_eq!(stats.total_kg, dec!(0));
    }
}
