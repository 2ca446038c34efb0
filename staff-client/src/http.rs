//! HTTP client wrapper
//!
//! Issues REST calls against the backend, attaches the bearer token,
//! unwraps the response envelope and turns 401s into a forced logout.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::navigation::{AuthEvent, Navigator, NoopNavigator, UnauthorizedHandler};
use crate::token::{MemoryTokenStore, TokenStore};
use crate::{ApiResponse, ClientConfig, ClientError, ClientResult};

/// A single REST call, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// HTTP client trait
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send the request and return the successful envelope
    ///
    /// Unsuccessful envelopes and non-2xx statuses come back as errors.
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse<Value>>;

    /// Send the request and deserialize the envelope's `data`
    async fn fetch<T: DeserializeOwned + Send>(&self, request: ApiRequest) -> ClientResult<T> {
        let envelope = self.execute(request).await?;
        let data = envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing response data".into()))?;
        Ok(serde_json::from_value(data)?)
    }

    /// Send the request, only the success flag matters
    async fn fetch_unit(&self, request: ApiRequest) -> ClientResult<()> {
        self.execute(request).await.map(|_| ())
    }
}

/// Network HTTP client (reqwest)
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: reqwest::Client,
    base_url: String,
    login_path: String,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    handlers: Arc<RwLock<Vec<Arc<dyn UnauthorizedHandler>>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl NetworkHttpClient {
    /// Create a client with an in-memory token slot and no attached view
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Self::with_parts(
            config,
            Arc::new(MemoryTokenStore::new()),
            Arc::new(NoopNavigator),
        )
    }

    pub fn with_parts(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            tokens,
            navigator,
            handlers: Arc::new(RwLock::new(Vec::new())),
            events,
        })
    }

    /// Base URL including the API prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token slot shared with the session
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.tokens)
    }

    /// Run `handler` on every 401, before the failing call returns
    pub fn add_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Receive authentication events (401 responses)
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> Option<String> {
        self.tokens.get().map(|t| format!("Bearer {}", t))
    }

    /// Session expired or token rejected: forget the token and go to login
    fn on_unauthorized(&self, path: &str) {
        tracing::warn!(path, "Request rejected with 401, clearing stored token");
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Failed to clear stored token");
        }
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler.on_unauthorized(path);
        }
        self.navigator.navigate(&self.login_path);
        // no subscribers is fine
        let _ = self.events.send(AuthEvent::Unauthorized {
            path: path.to_string(),
        });
    }

    async fn handle_response(
        &self,
        request: &ApiRequest,
        response: reqwest::Response,
    ) -> ClientResult<ApiResponse<Value>> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiResponse<Value>>(&text)
                .ok()
                .map(|envelope| envelope.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Unauthorized".to_string());
            self.on_unauthorized(&request.path);
            return Err(ClientError::Unauthorized(message));
        }

        let text = response.text().await?;

        if text.trim().is_empty() {
            return if status.is_success() && request.method == Method::DELETE {
                // delete endpoints may answer 200/204 without a body
                Ok(ApiResponse::deleted())
            } else if status.is_success() {
                Err(ClientError::InvalidResponse("Empty response body".into()))
            } else {
                Err(ClientError::api(status, status_message(status)))
            };
        }

        match serde_json::from_str::<ApiResponse<Value>>(&text) {
            Ok(envelope) if envelope.success && status.is_success() => Ok(envelope),
            Ok(envelope) => {
                tracing::debug!(%status, message = %envelope.message, "Server reported failure");
                Err(ClientError::api(status, envelope.message))
            }
            Err(e) if status.is_success() => Err(ClientError::InvalidResponse(e.to_string())),
            Err(_) => Err(ClientError::api(status, status_message(status))),
        }
    }
}

fn status_message(status: StatusCode) -> String {
    format!("Request failed with status code {}", status.as_u16())
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse<Value>> {
        let url = self.url(&request.path);
        let mut req = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }

        tracing::debug!(method = %request.method, path = %request.path, "Sending request");
        let response = req.send().await?;
        self.handle_response(&request, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RecordingNavigator;
    use axum::{Json, Router, routing::get};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl UnauthorizedHandler for CountingHandler {
        fn on_unauthorized(&self, _path: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Backend answering with the awkward shapes a real server may send
    fn backend() -> Router {
        Router::new()
            .route(
                "/api/departments",
                get(|| async {
                    Json(json!({
                        "success": false,
                        "message": "Department name already exists: Ops",
                        "data": null,
                        "timeStamp": "2024-05-01T10:15:30"
                    }))
                }),
            )
            .route(
                "/api/employees/7",
                get(|| async { StatusCode::OK }).delete(|| async { StatusCode::NO_CONTENT }),
            )
            .route(
                "/api/employees",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/api/auth/me",
                get(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"success": false, "message": "Token expired", "data": null})),
                    )
                }),
            )
    }

    async fn spawn_backend() -> ClientConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, backend()).await.unwrap();
        });
        ClientConfig::new(format!("http://{}/api", addr)).with_timeout(5)
    }

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::put("/employees/3/status")
            .query("status", "ACTIVE")
            .json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.query, vec![("status".to_string(), "ACTIVE".to_string())]);
        assert_eq!(req.body, Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_url_join() {
        let config = ClientConfig::new("http://localhost:8080/api/");
        let client = NetworkHttpClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/employees"), "http://localhost:8080/api/employees");
        assert_eq!(client.url("departments/2"), "http://localhost:8080/api/departments/2");
    }

    #[test]
    fn test_auth_header_follows_token_store() {
        let config = ClientConfig::default();
        let tokens = Arc::new(MemoryTokenStore::new());
        let client =
            NetworkHttpClient::with_parts(&config, tokens.clone(), Arc::new(NoopNavigator)).unwrap();
        assert!(client.auth_header().is_none());

        tokens.set("abc").unwrap();
        assert_eq!(client.auth_header().as_deref(), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_with_ok_status_is_an_error() {
        let client = NetworkHttpClient::new(&spawn_backend().await).unwrap();

        let err = client
            .execute(ApiRequest::get("/departments"))
            .await
            .unwrap_err();
        match &err {
            ClientError::Api { status, message } => {
                assert_eq!(*status, StatusCode::OK);
                assert_eq!(message, "Department name already exists: Ops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.message_or("Failed to fetch departments"),
            "Department name already exists: Ops"
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_only_accepted_for_delete() {
        let client = NetworkHttpClient::new(&spawn_backend().await).unwrap();

        let err = client
            .execute(ApiRequest::get("/employees/7"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));

        let deleted = client
            .execute(ApiRequest::delete("/employees/7"))
            .await
            .unwrap();
        assert!(deleted.success);
        assert_eq!(deleted.message, shared::response::DELETED_MESSAGE);
    }

    #[tokio::test]
    async fn test_non_json_error_body_uses_status_message() {
        let client = NetworkHttpClient::new(&spawn_backend().await).unwrap();

        let err = client
            .execute(ApiRequest::get("/employees"))
            .await
            .unwrap_err();
        assert_eq!(
            err.message_or("Failed to fetch employees"),
            "Request failed with status code 500"
        );
    }

    #[tokio::test]
    async fn test_unauthorized_runs_handlers_before_returning() {
        let config = spawn_backend().await;
        let tokens = Arc::new(MemoryTokenStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let client =
            NetworkHttpClient::with_parts(&config, tokens.clone(), navigator.clone()).unwrap();
        let handler = Arc::new(CountingHandler::default());
        client.add_unauthorized_handler(handler.clone());
        let mut events = client.subscribe();
        tokens.set("stale").unwrap();

        let err = client
            .execute(ApiRequest::get("/auth/me"))
            .await
            .unwrap_err();

        assert!(matches!(&err, ClientError::Unauthorized(m) if m == "Token expired"));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert!(tokens.get().is_none());
        assert_eq!(navigator.last().as_deref(), Some("/login"));
        assert_eq!(
            events.try_recv().unwrap(),
            AuthEvent::Unauthorized {
                path: "/auth/me".into()
            }
        );
    }
}
