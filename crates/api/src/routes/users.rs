//! User registry routes (admin screens for sellers and buyers).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use milkbook_core::auth::{require_admin, Role};
use milkbook_db::repositories::user::{UpdateUserInput, UserError, UserFilter, UserRepository};

/// Creates the user registry routes (auth middleware is applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/users/{id}/toggle-active", post(toggle_active))
}

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Filter by role.
    pub role: Option<Role>,
    /// Search across name, mobile, and email.
    pub search: Option<String>,
    /// Legacy alias for `search`.
    pub q: Option<String>,
}

/// Request body for updating a user.
///
/// `pending_amount` and `due` alias the same figure; resolved here so the
/// repository stays alias-free.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New display name.
    pub name: Option<String>,
    /// New mobile number.
    pub mobile: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New opening pending amount.
    pub opening_pending_amount: Option<Decimal>,
    /// New pending amount.
    pub pending_amount: Option<Decimal>,
    /// Legacy alias for `pending_amount`.
    pub due: Option<Decimal>,
}

impl UpdateUserRequest {
    fn into_input(self) -> UpdateUserInput {
        let pending_amount = self
            .pending_amount
            .or(self.due)
            .or(self.opening_pending_amount);
        UpdateUserInput {
            name: self.name,
            mobile: self.mobile,
            email: self.email,
            is_active: self.is_active,
            opening_pending_amount: self.opening_pending_amount,
            pending_amount,
        }
    }
}

/// GET `/users` - list users with role and search filters. Admin only.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = UserRepository::new((*state.db).clone());
    let filter = UserFilter {
        role: query.role,
        search: query.search.or(query.q),
    };

    match repo.list(filter).await {
        Ok(users) => (StatusCode::OK, Json(json!(users))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list users");
            user_error_response(&e)
        }
    }
}

/// GET `/users/{id}` - fetch one user. Admin only.
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.find_by_id(id).await {
        Ok(user) => (StatusCode::OK, Json(json!(user))).into_response(),
        Err(e) => user_error_response(&e),
    }
}

/// PUT `/users/{id}` - update a user. Admin only.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.update(id, payload.into_input()).await {
        Ok(user) => (StatusCode::OK, Json(json!(user))).into_response(),
        Err(e) => {
            error!(error = %e, user_id = %id, "failed to update user");
            user_error_response(&e)
        }
    }
}

/// DELETE `/users/{id}` - delete a user. Admin only.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "User deleted successfully" })),
        )
            .into_response(),
        Err(e) => user_error_response(&e),
    }
}

/// POST `/users/{id}/toggle-active` - flip a user's active flag. Admin only.
async fn toggle_active(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = check_admin(&auth) {
        return response;
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.toggle_active(id).await {
        Ok(user) => (StatusCode::OK, Json(json!(user))).into_response(),
        Err(e) => user_error_response(&e),
    }
}

fn check_admin(auth: &AuthUser) -> Result<(), Response> {
    require_admin(auth.role()).map_err(|e| {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "forbidden", "message": e.to_string() })),
        )
            .into_response()
    })
}

fn user_error_response(err: &UserError) -> Response {
    match err {
        UserError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "User not found" })),
        )
            .into_response(),
        UserError::MobileTaken => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "conflict",
                "message": "Mobile number already registered"
            })),
        )
            .into_response(),
        UserError::Password(_) | UserError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}
