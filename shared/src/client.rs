//! Auth API DTOs
//!
//! Request/response types for the `/auth` endpoints, shared between
//! staff-client and staff-mock.

use serde::{Deserialize, Serialize};

use crate::models::UserRole;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// 3-50 characters
    pub username: String,
    /// More than 6 characters
    pub password: String,
    pub email: String,
}

impl RegisterRequest {
    /// Credentials to log in with once registration succeeded
    pub fn credentials(&self) -> LoginRequest {
        LoginRequest::new(&self.username, &self.password)
    }
}

/// Login / refresh response data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: UserRole,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Refresh token request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefreshRequest {
    pub refresh_token: String,
}

/// Token validation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidationRequest {
    pub token: String,
}

/// Token validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}
