//! Milk rate management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use milkbook_core::auth::require_admin;
use milkbook_core::rates::{DeliverySession, MilkType};
use milkbook_db::repositories::milk_rate::{
    CreateRateInput, RateError, RateFilter, RateRepository, UpdateRateInput,
};
use milkbook_shared::types::PageRequest;

/// Creates the milk rate routes (auth middleware is applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/milk-rates", get(list_rates).post(create_rate))
        .route("/milk-rates/{id}", put(update_rate).delete(delete_rate))
}

/// Query parameters for the rate listing.
#[derive(Debug, Deserialize)]
pub struct ListRatesQuery {
    /// Filter by milk type.
    pub milk_type: Option<MilkType>,
    /// Filter by session.
    pub delivery_session: Option<DeliverySession>,
    /// Legacy alias for `delivery_session`.
    pub shift: Option<DeliverySession>,
    /// Only rates effective on or before this date.
    pub effective_date: Option<NaiveDate>,
    /// Filter by active flag.
    pub is_active: Option<bool>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl ListRatesQuery {
    /// Resolves the session alias: the canonical field wins.
    fn session(&self) -> Option<DeliverySession> {
        self.delivery_session.or(self.shift)
    }
}

/// Request body for creating (or merging) a rate.
#[derive(Debug, Deserialize)]
pub struct CreateRateRequest {
    /// Milk type.
    pub milk_type: MilkType,
    /// Session scope.
    pub delivery_session: Option<DeliverySession>,
    /// Legacy alias for `delivery_session`.
    pub shift: Option<DeliverySession>,
    /// Price per unit.
    pub price_per_unit: Decimal,
    /// First date the rate applies.
    pub effective_from: NaiveDate,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Request body for updating a rate.
#[derive(Debug, Deserialize)]
pub struct UpdateRateRequest {
    /// New milk type.
    pub milk_type: Option<MilkType>,
    /// New session scope.
    pub delivery_session: Option<DeliverySession>,
    /// Legacy alias for `delivery_session`.
    pub shift: Option<DeliverySession>,
    /// New price per unit.
    pub price_per_unit: Option<Decimal>,
    /// New effective-from date.
    pub effective_from: Option<NaiveDate>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// GET `/milk-rates` - administrative rate listing, most recent first.
async fn list_rates(
    State(state): State<AppState>,
    Query(query): Query<ListRatesQuery>,
) -> impl IntoResponse {
    let repo = RateRepository::new((*state.db).clone());

    let page = (query.page.is_some() || query.limit.is_some()).then(|| PageRequest {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(50),
    });

    let filter = RateFilter {
        milk_type: query.milk_type,
        session: query.session(),
        as_of_date: query.effective_date,
        is_active: query.is_active,
        page,
    };

    match repo.list(filter).await {
        Ok(rates) => (StatusCode::OK, Json(json!(rates))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list milk rates");
            rate_error_response(&e)
        }
    }
}

/// POST `/milk-rates` - create a rate, or overwrite the one occupying the
/// exact (milk type, session, effective-from) key. Admin only.
async fn create_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRateRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = RateRepository::new((*state.db).clone());

    // Rate rows created through the API are always session-scoped; the
    // canonical field wins over the legacy alias and defaults to morning.
    let session = payload
        .delivery_session
        .or(payload.shift)
        .unwrap_or(DeliverySession::Morning);

    let input = CreateRateInput {
        milk_type: payload.milk_type,
        session: Some(session),
        price_per_unit: payload.price_per_unit,
        effective_from: payload.effective_from,
        is_active: payload.is_active,
    };

    match repo.upsert(input).await {
        Ok(rate) => {
            info!(
                rate_id = %rate.id,
                price = %rate.price_per_unit,
                effective_from = %rate.effective_from,
                "milk rate upserted"
            );
            (StatusCode::CREATED, Json(json!(rate))).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to upsert milk rate");
            rate_error_response(&e)
        }
    }
}

/// PUT `/milk-rates/{id}` - update a rate. Admin only.
async fn update_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRateRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = RateRepository::new((*state.db).clone());
    let patch = UpdateRateInput {
        milk_type: payload.milk_type,
        session: payload.delivery_session.or(payload.shift),
        price_per_unit: payload.price_per_unit,
        effective_from: payload.effective_from,
        is_active: payload.is_active,
    };

    match repo.update(id, patch).await {
        Ok(rate) => (StatusCode::OK, Json(json!(rate))).into_response(),
        Err(e) => {
            error!(error = %e, rate_id = %id, "failed to update milk rate");
            rate_error_response(&e)
        }
    }
}

/// DELETE `/milk-rates/{id}` - delete a rate. Admin only.
async fn delete_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = RateRepository::new((*state.db).clone());
    match repo.remove(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Milk rate deleted successfully" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, rate_id = %id, "failed to delete milk rate");
            rate_error_response(&e)
        }
    }
}

/// Maps the caller's explicit role through the core guard.
fn check_admin(auth: &AuthUser) -> Result<(), Response> {
    require_admin(auth.role()).map_err(|e| {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "forbidden", "message": e.to_string() })),
        )
            .into_response()
    })
}

fn rate_error_response(err: &RateError) -> Response {
    match err {
        RateError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": format!("Milk rate not found: {id}")
            })),
        )
            .into_response(),
        RateError::Duplicate { conflicting_rate_id } => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "conflict",
                "message": "Rate already exists for this milkType/session/effectiveFrom combination",
                "conflicting_rate_id": conflicting_rate_id
            })),
        )
            .into_response(),
        RateError::NegativePrice => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": "Price per unit must not be negative"
            })),
        )
            .into_response(),
        RateError::Resolution(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "rate_not_found", "message": e.to_string() })),
        )
            .into_response(),
        RateError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_alias_canonical_wins() {
        let query = ListRatesQuery {
            milk_type: None,
            delivery_session: Some(DeliverySession::Evening),
            shift: Some(DeliverySession::Morning),
            effective_date: None,
            is_active: None,
            page: None,
            limit: None,
        };
        assert_eq!(query.session(), Some(DeliverySession::Evening));
    }

    #[test]
    fn test_session_alias_falls_back_to_shift() {
        let query = ListRatesQuery {
            milk_type: None,
            delivery_session: None,
            shift: Some(DeliverySession::Morning),
            effective_date: None,
            is_active: None,
            page: None,
            limit: None,
        };
        assert_eq!(query.session(), Some(DeliverySession::Morning));
    }
}
