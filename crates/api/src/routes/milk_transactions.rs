//! Milk transaction routes: the delivery ledger, stats, and buyer billing.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use milkbook_core::auth::{require_admin, require_delivery_recorder};
use milkbook_core::billing::{resolve_period, BillingError};
use milkbook_core::ledger::TransactionStatus;
use milkbook_core::pricing::PricingError;
use milkbook_core::rates::{DeliverySession, MilkType};
use milkbook_db::repositories::milk_transaction::{
    CreateTransactionInput, TransactionError, TransactionFilter, TransactionRepository,
    UpdateTransactionInput,
};

/// Creates the milk transaction routes (auth middleware is applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/milk-transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/milk-transactions/sellers/stats", get(all_sellers_stats))
        .route(
            "/milk-transactions/seller/{seller_id}/stats",
            get(seller_stats),
        )
        .route("/milk-transactions/buyer/{buyer_id}/stats", get(buyer_stats))
        .route(
            "/milk-transactions/buyer/{buyer_id}/billing",
            get(buyer_billing),
        )
        .route(
            "/milk-transactions/{id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

/// Request body for recording a delivery.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
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
    /// Delivery session.
    pub delivery_session: Option<DeliverySession>,
    /// Legacy alias for `delivery_session`.
    pub shift: Option<DeliverySession>,
    /// Milk type; defaults to cow.
    pub milk_type: Option<MilkType>,
    /// Free-form remarks.
    pub remarks: Option<String>,
}

/// Request body for updating a transaction.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New quantity.
    pub quantity: Option<Decimal>,
    /// New status.
    pub status: Option<TransactionStatus>,
    /// New delivery date.
    pub date: Option<NaiveDate>,
    /// New delivery session.
    pub delivery_session: Option<DeliverySession>,
    /// Legacy alias for `delivery_session`.
    pub shift: Option<DeliverySession>,
    /// New milk type.
    pub milk_type: Option<MilkType>,
    /// New unit token.
    pub unit: Option<String>,
    /// New remarks.
    pub remarks: Option<String>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
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

/// Query parameters for per-party stats (both bounds required).
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Range start (inclusive).
    pub start_date: NaiveDate,
    /// Range end (inclusive).
    pub end_date: NaiveDate,
}

/// Query parameters for the all-sellers dashboard aggregation.
#[derive(Debug, Deserialize)]
pub struct AllSellersStatsQuery {
    /// Range start (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Range end (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Filter by status.
    pub status: Option<TransactionStatus>,
}

/// Query parameters for buyer billing: a month token, or an explicit pair,
/// or nothing (current month).
#[derive(Debug, Deserialize)]
pub struct BillingQuery {
    /// Month token, `YYYY-MM`.
    pub month: Option<String>,
    /// Explicit range start.
    pub start_date: Option<NaiveDate>,
    /// Explicit range end.
    pub end_date: Option<NaiveDate>,
}

/// POST `/milk-transactions` - record a delivery for the authenticated
/// seller. Buyers may not record transactions.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    if let Err(e) = require_delivery_recorder(auth.role()) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "forbidden", "message": e.to_string() })),
        )
            .into_response();
    }

    let repo = transaction_repo(&state);
    let input = CreateTransactionInput {
        buyer_id: payload.buyer_id,
        date: payload.date,
        quantity: payload.quantity,
        unit: payload.unit,
        status: payload.status,
        delivery_session: payload.delivery_session.or(payload.shift),
        milk_type: payload.milk_type,
        remarks: payload.remarks,
    };

    match repo.create(auth.user_id(), input).await {
        Ok(transaction) => {
            info!(transaction_id = %transaction.id, "milk transaction created");
            (StatusCode::CREATED, Json(json!(transaction))).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to create milk transaction");
            transaction_error_response(&e)
        }
    }
}

/// GET `/milk-transactions` - list transactions, date descending.
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> impl IntoResponse {
    let repo = transaction_repo(&state);
    let filter = TransactionFilter {
        seller_id: query.seller_id,
        buyer_id: query.buyer_id,
        status: query.status,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    match repo.query(filter).await {
        Ok(transactions) => (StatusCode::OK, Json(json!(transactions))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list milk transactions");
            transaction_error_response(&e)
        }
    }
}

/// GET `/milk-transactions/{id}` - fetch one transaction.
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = transaction_repo(&state);
    match repo.find_by_id(id).await {
        Ok(transaction) => (StatusCode::OK, Json(json!(transaction))).into_response(),
        Err(e) => transaction_error_response(&e),
    }
}

/// PUT `/milk-transactions/{id}` - update a transaction, re-pricing when
/// pricing-relevant fields change.
async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    let repo = transaction_repo(&state);
    let patch = UpdateTransactionInput {
        quantity: payload.quantity,
        status: payload.status,
        date: payload.date,
        delivery_session: payload.delivery_session.or(payload.shift),
        milk_type: payload.milk_type,
        unit: payload.unit,
        remarks: payload.remarks,
    };

    match repo.update(id, patch).await {
        Ok(transaction) => (StatusCode::OK, Json(json!(transaction))).into_response(),
        Err(e) => {
            error!(error = %e, transaction_id = %id, "failed to update milk transaction");
            transaction_error_response(&e)
        }
    }
}

/// DELETE `/milk-transactions/{id}` - hard-delete a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = transaction_repo(&state);
    match repo.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Transaction deleted successfully" })),
        )
            .into_response(),
        Err(e) => transaction_error_response(&e),
    }
}

/// GET `/milk-transactions/sellers/stats` - per-seller aggregation for the
/// administrative dashboard.
async fn all_sellers_stats(
    State(state): State<AppState>,
    Query(query): Query<AllSellersStatsQuery>,
) -> impl IntoResponse {
    let repo = transaction_repo(&state);
    match repo
        .all_sellers_stats(query.start_date, query.end_date, query.status)
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(json!(rows))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to aggregate seller stats");
            transaction_error_response(&e)
        }
    }
}

/// GET `/milk-transactions/seller/{seller_id}/stats` - one seller's totals
/// over a date range.
async fn seller_stats(
    State(state): State<AppState>,
    Path(seller_id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let repo = transaction_repo(&state);
    match repo
        .seller_stats(seller_id, query.start_date, query.end_date)
        .await
    {
        Ok(stats) => (StatusCode::OK, Json(json!(stats))).into_response(),
        Err(e) => {
            error!(error = %e, seller_id = %seller_id, "failed to aggregate seller stats");
            transaction_error_response(&e)
        }
    }
}

/// GET `/milk-transactions/buyer/{buyer_id}/stats` - one buyer's totals over
/// a date range.
async fn buyer_stats(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let repo = transaction_repo(&state);
    match repo
        .buyer_stats(buyer_id, query.start_date, query.end_date)
        .await
    {
        Ok(stats) => (StatusCode::OK, Json(json!(stats))).into_response(),
        Err(e) => {
            error!(error = %e, buyer_id = %buyer_id, "failed to aggregate buyer stats");
            transaction_error_response(&e)
        }
    }
}

/// GET `/milk-transactions/buyer/{buyer_id}/billing` - the buyer's billing
/// statement for a resolved period. Admin only.
async fn buyer_billing(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(buyer_id): Path<Uuid>,
    Query(query): Query<BillingQuery>,
) -> impl IntoResponse {
    if let Err(e) = require_admin(auth.role()) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "forbidden", "message": e.to_string() })),
        )
            .into_response();
    }

    let today = chrono::Utc::now().date_naive();
    let period = match resolve_period(
        query.month.as_deref(),
        query.start_date,
        query.end_date,
        today,
    ) {
        Ok(period) => period,
        Err(BillingError::InvalidPeriod(message)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_period", "message": message })),
            )
                .into_response();
        }
    };

    let repo = transaction_repo(&state);
    match repo.buyer_billing(buyer_id, &period).await {
        Ok(statement) => (StatusCode::OK, Json(json!(statement))).into_response(),
        Err(e) => {
            error!(error = %e, buyer_id = %buyer_id, "failed to build billing statement");
            transaction_error_response(&e)
        }
    }
}

fn transaction_repo(state: &AppState) -> TransactionRepository {
    TransactionRepository::new((*state.db).clone(), state.notifier.clone())
}

fn transaction_error_response(err: &TransactionError) -> Response {
    match err {
        TransactionError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Transaction not found"
            })),
        )
            .into_response(),
        TransactionError::SellerNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "Seller not found" })),
        )
            .into_response(),
        TransactionError::BuyerNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "Buyer not found" })),
        )
            .into_response(),
        TransactionError::Pricing(PricingError::InvalidQuantity) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_quantity",
                "message": "Quantity must be greater than 0 for delivered entries"
            })),
        )
            .into_response(),
        TransactionError::Pricing(PricingError::RateNotFound(e)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "rate_not_found", "message": e.to_string() })),
        )
            .into_response(),
        TransactionError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}
