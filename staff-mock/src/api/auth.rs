//! `/auth` handlers
//!
//! `/auth/me` and `/auth/validate` answer with the regular envelope so every
//! route can be consumed the same way.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use shared::ApiResponse;
use shared::client::{
    AuthResponse, LoginRequest, RegisterRequest, TokenRefreshRequest, TokenValidation,
    TokenValidationRequest,
};
use shared::models::User;

use super::{CurrentUser, bearer};
use crate::error::{MockError, MockResult};
use crate::state::MockState;

pub(super) fn routes() -> Router<Arc<MockState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/auth/validate", post(validate))
        .route("/auth/health", get(health))
}

pub(super) fn protected_routes() -> Router<Arc<MockState>> {
    Router::new().route("/auth/me", get(me))
}

async fn login(
    State(state): State<Arc<MockState>>,
    Json(req): Json<LoginRequest>,
) -> MockResult<Json<ApiResponse<AuthResponse>>> {
    let auth = state.store.write().await.login(&req.username, &req.password)?;
    tracing::info!(username = %auth.username, "Login successful");
    Ok(Json(ApiResponse::ok_with_message(auth, "Login successful")))
}

async fn register(
    State(state): State<Arc<MockState>>,
    Json(req): Json<RegisterRequest>,
) -> MockResult<Json<ApiResponse<()>>> {
    state
        .store
        .write()
        .await
        .register(&req.username, &req.password, &req.email)?;
    Ok(Json(ApiResponse::message("Registration successful")))
}

async fn logout(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<ApiResponse<()>> {
    if let Some(token) = bearer(&headers) {
        state.store.write().await.revoke(token);
    }
    Json(ApiResponse::message("Logout successful"))
}

async fn refresh(
    State(state): State<Arc<MockState>>,
    Json(req): Json<TokenRefreshRequest>,
) -> MockResult<Json<ApiResponse<AuthResponse>>> {
    let auth = state.store.write().await.refresh(&req.refresh_token)?;
    Ok(Json(ApiResponse::ok_with_message(
        auth,
        "Token refreshed successfully",
    )))
}

async fn validate(
    State(state): State<Arc<MockState>>,
    Json(req): Json<TokenValidationRequest>,
) -> Json<ApiResponse<TokenValidation>> {
    let username = state
        .store
        .read()
        .await
        .token_owner(&req.token)
        .map(str::to_string);
    Json(ApiResponse::ok(TokenValidation {
        valid: username.is_some(),
        username,
    }))
}

async fn me(
    State(state): State<Arc<MockState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> MockResult<Json<ApiResponse<User>>> {
    let user = state
        .store
        .read()
        .await
        .user_by_name(&username)
        .ok_or_else(|| MockError::Unauthorized("User not found".into()))?;
    Ok(Json(ApiResponse::ok(user)))
}

async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Service is healthy"))
}
