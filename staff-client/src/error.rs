//! Client error types

use http::StatusCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure, no usable response received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an envelope marked unsuccessful
    #[error("{message}")]
    Api {
        /// HTTP status of the response
        status: StatusCode,
        /// Server-provided message (may be empty)
        message: String,
    },

    /// 401 from any call, the session has already been torn down
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Operation refused before reaching the server
    #[error("{0}")]
    Rejected(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Token storage error
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// Build a business failure from an unsuccessful envelope
    pub fn api(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// Human-readable message for display
    ///
    /// Server message first, then the transport/wrapper message, then `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        let message = match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Unauthorized(message)
            | ClientError::Rejected(message)
            | ClientError::InvalidResponse(message) => message.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    /// Replace an empty server message with the operation's fallback
    pub fn with_fallback(self, fallback: &str) -> Self {
        match self {
            ClientError::Api { status, message } if message.trim().is_empty() => ClientError::Api {
                status,
                message: fallback.to_string(),
            },
            other => other,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
