//! REST routes under `/api`

mod auth;
mod departments;
mod employees;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{MockError, MockResult};
use crate::state::MockState;

/// Username behind the request's bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

pub(crate) fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Reject requests without a live access token
async fn require_auth(
    State(state): State<Arc<MockState>>,
    mut req: Request,
    next: Next,
) -> MockResult<Response> {
    let token = bearer(req.headers())
        .ok_or_else(|| MockError::Unauthorized("Access denied".into()))?
        .to_string();
    let username = state
        .store
        .read()
        .await
        .token_owner(&token)
        .map(str::to_string)
        .ok_or_else(|| MockError::Unauthorized("Invalid or expired token".into()))?;
    req.extensions_mut().insert(CurrentUser(username));
    Ok(next.run(req).await)
}

pub fn router(state: Arc<MockState>) -> Router {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(employees::routes())
        .merge(departments::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", auth::routes().merge(protected))
        .layer(ConcurrencyLimitLayer::new(100))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
