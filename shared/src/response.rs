//! API Response types
//!
//! Every backend response body is wrapped in the same envelope.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Message used when an empty-bodied delete is turned into an envelope
pub const DELETED_MESSAGE: &str = "Deleted successfully";

/// Unified API response envelope
///
/// All API responses follow this format:
/// ```json
/// {
///     "success": true,
///     "message": "Employee created successfully",
///     "data": { ... },
///     "timeStamp": "2024-05-01T10:15:30"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the server considers the operation successful
    pub success: bool,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Response payload (absent for void operations)
    pub data: Option<T>,
    /// Technical error detail on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Server-side time the response was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<NaiveDateTime>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self::ok_with_message(data, "Success")
    }

    /// Create a successful response with custom message
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            time_stamp: Some(now()),
        }
    }

    /// Create a successful response that carries no data
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            time_stamp: Some(now()),
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
            time_stamp: Some(now()),
        }
    }

    /// Create an error response with a technical detail
    pub fn error_with_detail(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::error(message)
        }
    }

    /// Envelope standing in for a delete that answered with an empty body
    pub fn deleted() -> Self {
        Self::message(DELETED_MESSAGE)
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
