//! Error responses
//!
//! Every failure is answered with the regular envelope, `success: false`,
//! a short `message` and the detail in `error`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Missing, unknown or revoked bearer token (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource does not exist (404)
    #[error("{0} not found")]
    NotFound(String),

    /// Request data rejected (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unique constraint hit (400)
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Department still has employees (400)
    #[error("Cannot delete department: {0}")]
    DepartmentNotEmpty(String),

    /// Bad credentials or token (400)
    #[error("{0}")]
    Auth(String),
}

pub type MockResult<T> = Result<T, MockError>;

impl MockError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match &self {
            MockError::Unauthorized(detail) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), detail.clone())
            }
            MockError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "Resource not found".to_string(),
                format!("{} not found", resource),
            ),
            MockError::Validation(detail) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                detail.clone(),
            ),
            MockError::Conflict(detail) => (StatusCode::BAD_REQUEST, detail.clone(), detail.clone()),
            MockError::DepartmentNotEmpty(detail) => (
                StatusCode::BAD_REQUEST,
                "Cannot delete department".to_string(),
                detail.clone(),
            ),
            MockError::Auth(detail) => (StatusCode::BAD_REQUEST, detail.clone(), detail.clone()),
        };

        tracing::debug!(%status, error = %self, "Request failed");
        let body = Json(ApiResponse::<()>::error_with_detail(message, detail));
        (status, body).into_response()
    }
}
