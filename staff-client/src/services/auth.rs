//! Auth service - `/auth` endpoints

use std::sync::Arc;

use shared::client::{
    AuthResponse, LoginRequest, RegisterRequest, TokenRefreshRequest, TokenValidation,
    TokenValidationRequest,
};
use shared::models::User;

use crate::ClientResult;
use crate::http::{ApiRequest, HttpClient, NetworkHttpClient};

/// Auth API
pub struct AuthService<H = NetworkHttpClient> {
    http: Arc<H>,
}

impl<H> Clone for AuthService<H> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
        }
    }
}

impl<H: HttpClient> AuthService<H> {
    pub fn new(http: Arc<H>) -> Self {
        Self { http }
    }

    /// Login with username and password
    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<AuthResponse> {
        self.http
            .fetch(ApiRequest::post("/auth/login").json(credentials)?)
            .await
            .map_err(|e| e.with_fallback("Login failed"))
    }

    /// Create an account; the caller logs in afterwards
    pub async fn register(&self, data: &RegisterRequest) -> ClientResult<()> {
        self.http
            .fetch_unit(ApiRequest::post("/auth/register").json(data)?)
            .await
            .map_err(|e| e.with_fallback("Registration failed"))
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.http.fetch_unit(ApiRequest::post("/auth/logout")).await
    }

    /// Get current user information
    pub async fn me(&self) -> ClientResult<User> {
        self.http
            .fetch(ApiRequest::get("/auth/me"))
            .await
            .map_err(|e| e.with_fallback("Failed to get user info"))
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, refresh_token: &str) -> ClientResult<AuthResponse> {
        let body = TokenRefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.http
            .fetch(ApiRequest::post("/auth/refresh").json(&body)?)
            .await
            .map_err(|e| e.with_fallback("Failed to refresh token"))
    }

    pub async fn validate(&self, token: &str) -> ClientResult<TokenValidation> {
        let body = TokenValidationRequest {
            token: token.to_string(),
        };
        self.http
            .fetch(ApiRequest::post("/auth/validate").json(&body)?)
            .await
            .map_err(|e| e.with_fallback("Failed to validate token"))
    }
}
