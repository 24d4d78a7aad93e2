//! Authentication routes: registration and login.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use validator::Validate;

use crate::AppState;
use milkbook_core::auth::{verify_password, Role};
use milkbook_db::repositories::user::{CreateUserInput, UserError, UserRepository};

/// Creates the authentication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Request body for registration.
///
/// `pending_amount` and `due` are legacy aliases for the same figure; the
/// precedence is resolved here, before the input reaches the repository.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name.
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    /// Mobile number.
    #[validate(length(min = 10, max = 15))]
    pub mobile: String,
    /// Password.
    #[validate(length(min = 6))]
    pub password: String,
    /// Optional email.
    #[validate(email)]
    pub email: Option<String>,
    /// Role; "seller" or "buyer" (admins are provisioned, not registered).
    pub role: Option<Role>,
    /// Opening pending amount carried over from outside the system.
    pub opening_pending_amount: Option<Decimal>,
    /// Current pending amount.
    pub pending_amount: Option<Decimal>,
    /// Legacy alias for `pending_amount`.
    pub due: Option<Decimal>,
}

impl RegisterRequest {
    /// Resolves the pending-amount aliases: first defined wins, in the
    /// order opening -> pending -> due for the opening figure and
    /// pending -> due -> opening for the current figure.
    fn pending_amounts(&self) -> (Decimal, Decimal) {
        let opening = self
            .opening_pending_amount
            .or(self.pending_amount)
            .or(self.due)
            .unwrap_or(Decimal::ZERO);
        let pending = self
            .pending_amount
            .or(self.due)
            .or(self.opening_pending_amount)
            .unwrap_or(opening);
        (opening, pending)
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Mobile number.
    pub mobile: String,
    /// Password.
    pub password: String,
}

/// POST `/auth/register` - register a seller or buyer account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "validation_error", "message": e.to_string() })),
        )
            .into_response();
    }

    let role = payload.role.unwrap_or(Role::Seller);
    if role == Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Admin accounts cannot be self-registered"
            })),
        )
            .into_response();
    }

    let repo = UserRepository::new((*state.db).clone());
    let (opening_pending_amount, pending_amount) = payload.pending_amounts();
    let input = CreateUserInput {
        name: payload.name,
        mobile: payload.mobile,
        email: payload.email,
        password: payload.password,
        role: Some(role),
        is_active: None,
        opening_pending_amount,
        pending_amount,
    };

    match repo.create(input).await {
        Ok(user) => {
            info!(user_id = %user.id, role = %role, "user registered");
            (StatusCode::CREATED, Json(json!(user))).into_response()
        }
        Err(UserError::MobileTaken) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "conflict",
                "message": "Mobile number already registered"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to register user");
            internal_error()
        }
    }
}

/// POST `/auth/login` - exchange mobile + password for an access token.
async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> impl IntoResponse {
    let repo = UserRepository::new((*state.db).clone());

    let user = match repo.find_by_mobile(&payload.mobile).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "failed to look up user for login");
            return internal_error();
        }
    };

    let Some(user) = user.filter(|u| u.is_active) else {
        return invalid_credentials();
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(e) => {
            error!(error = %e, "password verification failed");
            return internal_error();
        }
    }

    let role: Role = user.role.clone().into();
    let token = match state
        .jwt_service
        .generate_access_token(user.id, &role.to_string())
    {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "failed to generate access token");
            return internal_error();
        }
    };

    info!(user_id = %user.id, "user logged in");
    (
        StatusCode::OK,
        Json(json!({
            "user": user,
            "access_token": token,
            "expires_in": state.jwt_service.access_token_expires_in()
        })),
    )
        .into_response()
}

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_credentials",
            "message": "Invalid mobile or password"
        })),
    )
        .into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn request(
        opening: Option<Decimal>,
        pending: Option<Decimal>,
        due: Option<Decimal>,
    ) -> RegisterRequest {
        RegisterRequest {
            name: "Test".to_string(),
            mobile: "9000000000".to_string(),
            password: "secret".to_string(),
            email: None,
            role: None,
            opening_pending_amount: opening,
            pending_amount: pending,
            due,
        }
    }

    #[test]
    fn test_pending_amounts_default_to_zero() {
        assert_eq!(
            request(None, None, None).pending_amounts(),
            (Decimal::ZERO, Decimal::ZERO)
        );
    }

    #[test]
    fn test_due_alias_feeds_both_figures() {
        assert_eq!(
            request(None, None, Some(dec!(120))).pending_amounts(),
            (dec!(120), dec!(120))
        );
    }

    #[test]
    fn test_explicit_fields_win_over_due() {
        assert_eq!(
            request(Some(dec!(10)), Some(dec!(30)), Some(dec!(99))).pending_amounts(),
            (dec!(10), dec!(30))
        );
    }
}
