//! Session container
//!
//! One [`SessionStore`] per application, shared by cloning. Views read
//! [`Session`] snapshots or subscribe to changes. A [`SessionReset`]
//! registered with the HTTP client drops the session on a 401 before the
//! failing call returns.

use std::sync::{Arc, Weak};

use shared::client::{LoginRequest, RegisterRequest};
use shared::models::{User, UserRole};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::http::{HttpClient, NetworkHttpClient};
use crate::navigation::{AuthEvent, UnauthorizedHandler};
use crate::services::AuthService;
use crate::token::TokenStore;
use crate::{ClientError, ClientResult};

/// Authentication state visible to views
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    /// True until initialization settles and while a login is in flight
    pub is_loading: bool,
    /// A login or registration is in flight
    pub authenticating: bool,
    pub error: Option<String>,
}

impl Session {
    /// State before initialization has run
    pub fn initial() -> Self {
        Self {
            is_loading: true,
            ..Self::anonymous()
        }
    }

    /// Settled, logged-out state
    pub fn anonymous() -> Self {
        Self {
            user: None,
            access_token: None,
            refresh_token: None,
            is_authenticated: false,
            is_loading: false,
            authenticating: false,
            error: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated {
            SessionPhase::Authenticated
        } else if self.authenticating {
            SessionPhase::Authenticating
        } else if self.error.is_some() {
            SessionPhase::Error
        } else {
            SessionPhase::Anonymous
        }
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role() == Some(role)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
    Error,
}

/// Resets a [`SessionStore`] after the server rejected its token
///
/// Holds the session weakly; once every store clone is gone it only
/// clears the token slot.
#[derive(Debug, Clone)]
pub struct SessionReset {
    state: Weak<watch::Sender<Session>>,
    tokens: Arc<dyn TokenStore>,
}

impl SessionReset {
    pub fn reset(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Failed to clear stored token");
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let was_authenticated = state.borrow().is_authenticated;
        if was_authenticated {
            tracing::info!("Session rejected by server, logging out");
        }
        state.send_replace(Session::anonymous());
    }
}

impl UnauthorizedHandler for SessionReset {
    fn on_unauthorized(&self, path: &str) {
        tracing::debug!(path, "Unauthorized response");
        self.reset();
    }
}

/// Shared session container
pub struct SessionStore<H = NetworkHttpClient> {
    auth: AuthService<H>,
    tokens: Arc<dyn TokenStore>,
    state: Arc<watch::Sender<Session>>,
}

impl<H> Clone for SessionStore<H> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            tokens: Arc::clone(&self.tokens),
            state: Arc::clone(&self.state),
        }
    }
}

impl<H: HttpClient + 'static> SessionStore<H> {
    /// `tokens` must be the slot the HTTP client reads its bearer token from
    pub fn new(http: Arc<H>, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(Session::initial());
        Self {
            auth: AuthService::new(http),
            tokens,
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    fn modify(&self, f: impl FnOnce(&mut Session)) {
        self.state.send_modify(f);
    }

    /// Settle the initial loading state; no request is made
    pub fn initialize(&self) {
        self.modify(|s| s.is_loading = false);
    }

    /// Pick up a token left in the token store by an earlier run
    ///
    /// Returns the user when the token is still accepted.
    pub async fn resume(&self) -> ClientResult<Option<User>> {
        let Some(token) = self.tokens.get() else {
            self.initialize();
            return Ok(None);
        };
        self.modify(|s| {
            s.access_token = Some(token);
            s.is_loading = true;
        });
        self.current_user().await
    }

    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<()> {
        self.modify(|s| {
            s.is_loading = true;
            s.authenticating = true;
            s.error = None;
        });

        let auth = match self.auth.login(credentials).await {
            Ok(auth) => auth,
            Err(e) => {
                self.fail_login(&e, "Login failed");
                return Err(e);
            }
        };
        if let Err(e) = self.tokens.set(&auth.access_token) {
            let e = ClientError::from(e);
            self.fail_login(&e, "Login failed");
            return Err(e);
        }

        let user = User::provisional(&auth.username, &auth.email, auth.role);
        self.modify(|s| {
            s.user = Some(user);
            s.access_token = Some(auth.access_token);
            s.refresh_token = Some(auth.refresh_token);
            s.is_authenticated = true;
            s.is_loading = false;
            s.authenticating = false;
            s.error = None;
        });
        tracing::info!(username = %auth.username, role = %auth.role, "Logged in");

        // the provisional user stays in place if the profile cannot be loaded
        if let Err(e) = self.current_user().await {
            tracing::warn!(error = %e, "Could not complete user profile after login");
        }
        Ok(())
    }

    fn fail_login(&self, error: &ClientError, fallback: &str) {
        let message = error.message_or(fallback);
        tracing::warn!(error = %message, "Authentication failed");
        self.modify(|s| {
            s.user = None;
            s.access_token = None;
            s.is_authenticated = false;
            s.is_loading = false;
            s.authenticating = false;
            s.error = Some(message);
        });
    }

    /// Create an account, then log in with it
    pub async fn register(&self, data: &RegisterRequest) -> ClientResult<()> {
        self.modify(|s| {
            s.is_loading = true;
            s.authenticating = true;
            s.error = None;
        });
        if let Err(e) = self.auth.register(data).await {
            self.fail_login(&e, "Registration failed");
            return Err(e);
        }
        tracing::info!(username = %data.username, "Registered");
        self.login(&data.credentials()).await
    }

    /// Log out; always ends anonymous, whatever the server says
    pub async fn logout(&self) {
        if self.tokens.get().is_some()
            && let Err(e) = self.auth.logout().await
        {
            tracing::debug!(error = %e, "Ignoring failed logout request");
        }
        self.reset();
        tracing::info!("Logged out");
    }

    fn reset(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Failed to clear stored token");
        }
        self.state.send_replace(Session::anonymous());
    }

    /// Load the full user record for the held token
    ///
    /// Without a token this only settles `is_loading`. A 401 ends the
    /// session; other failures are recorded but keep the session.
    pub async fn current_user(&self) -> ClientResult<Option<User>> {
        if self.tokens.get().is_none() {
            self.modify(|s| s.is_loading = false);
            return Ok(None);
        }

        match self.auth.me().await {
            Ok(user) => {
                self.modify(|s| {
                    s.user = Some(user.clone());
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Session expired");
                self.reset();
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to get user info");
                self.modify(|s| {
                    s.error = Some("Failed to get user info".to_string());
                    s.is_loading = false;
                });
                Err(e)
            }
        }
    }

    /// Trade the held refresh token for a new token pair
    ///
    /// Any failure ends the session.
    pub async fn refresh_access_token(&self) -> ClientResult<()> {
        let Some(refresh_token) = self.snapshot().refresh_token else {
            return Err(ClientError::Rejected("No refresh token available".into()));
        };

        match self.auth.refresh(&refresh_token).await {
            Ok(auth) => {
                // the server already rotated the pair, the old one is useless
                if let Err(e) = self.tokens.set(&auth.access_token) {
                    let e = ClientError::from(e);
                    tracing::warn!(error = %e, "Could not store refreshed token, ending session");
                    self.reset();
                    return Err(e);
                }
                self.modify(|s| {
                    s.access_token = Some(auth.access_token);
                    s.refresh_token = Some(auth.refresh_token);
                });
                tracing::debug!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                self.reset();
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.modify(|s| s.error = None);
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.state.borrow().has_role(role)
    }

    /// Handle that resets this session, for registration with an HTTP client
    pub fn reset_handle(&self) -> SessionReset {
        SessionReset {
            state: Arc::downgrade(&self.state),
            tokens: Arc::clone(&self.tokens),
        }
    }

    /// Drop the session after the server rejected the token
    pub fn handle_unauthorized(&self) {
        self.reset_handle().reset();
    }

    /// Reset the session for every [`AuthEvent`] from another source
    ///
    /// The task holds neither the HTTP client nor the session and ends
    /// once every sender of `events` is dropped.
    pub fn listen_for_auth_events(&self, mut events: broadcast::Receiver<AuthEvent>) -> JoinHandle<()> {
        let reset = self.reset_handle();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::Unauthorized { path }) => reset.on_unauthorized(&path),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Auth event listener lagged");
                        reset.reset();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiResponse;
    use crate::services::fake::FakeHttp;
    use crate::token::MemoryTokenStore;
    use http::StatusCode;
    use serde_json::json;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Token slot whose writes can be made to fail
    #[derive(Debug, Default)]
    struct LockableTokenStore {
        inner: MemoryTokenStore,
        locked: AtomicBool,
    }

    impl TokenStore for LockableTokenStore {
        fn get(&self) -> Option<String> {
            self.inner.get()
        }

        fn set(&self, token: &str) -> io::Result<()> {
            if self.locked.load(Ordering::SeqCst) {
                return Err(io::Error::other("read-only token file"));
            }
            self.inner.set(token)
        }

        fn clear(&self) -> io::Result<()> {
            self.inner.clear()
        }
    }

    fn store() -> (Arc<FakeHttp>, Arc<MemoryTokenStore>, SessionStore<FakeHttp>) {
        let http = Arc::new(FakeHttp::new());
        let tokens = Arc::new(MemoryTokenStore::new());
        let session = SessionStore::new(http.clone(), tokens.clone());
        (http, tokens, session)
    }

    fn login_reply(http: &FakeHttp) {
        http.reply_data(json!({
            "accessToken": "tok1",
            "refreshToken": "ref1",
            "username": "admin",
            "email": "a@x.com",
            "role": "ADMIN"
        }));
    }

    #[test]
    fn test_phases() {
        let mut session = Session::initial();
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(session.is_loading);

        session.authenticating = true;
        assert_eq!(session.phase(), SessionPhase::Authenticating);

        session.authenticating = false;
        session.error = Some("bad".into());
        assert_eq!(session.phase(), SessionPhase::Error);

        session.is_authenticated = true;
        assert_eq!(session.phase(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_initialize_makes_no_request() {
        let (http, _, session) = store();
        assert!(session.snapshot().is_loading);
        session.initialize();
        assert_eq!(session.snapshot(), Session::anonymous());
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_keeps_provisional_user_when_profile_fails() {
        let (http, tokens, session) = store();
        login_reply(&http);
        http.reply(Err(ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, "boom")));

        session
            .login(&LoginRequest::new("admin", "password123"))
            .await
            .unwrap();

        let state = session.snapshot();
        assert!(state.is_authenticated);
        assert!(session.is_admin());
        assert_eq!(state.user.as_ref().map(|u| u.id), Some(0));
        assert_eq!(state.error.as_deref(), Some("Failed to get user info"));
        assert_eq!(tokens.get().as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_login_failure_sets_error() {
        let (http, tokens, session) = store();
        http.reply(Err(ClientError::api(StatusCode::UNAUTHORIZED, "")));

        let result = session.login(&LoginRequest::new("admin", "nope")).await;
        assert!(result.is_err());

        let state = session.snapshot();
        assert!(!state.is_authenticated);
        assert_eq!(state.phase(), SessionPhase::Error);
        assert_eq!(state.error.as_deref(), Some("Login failed"));
        assert!(tokens.get().is_none());
    }

    #[tokio::test]
    async fn test_current_user_without_token_is_noop() {
        let (http, _, session) = store();
        assert!(session.current_user().await.unwrap().is_none());
        assert!(!session.snapshot().is_loading);
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_current_user_401_logs_out() {
        let (http, tokens, session) = store();
        login_reply(&http);
        http.reply(Ok(ApiResponse::ok(json!({
            "id": 1, "username": "admin", "email": "a@x.com", "role": "ADMIN"
        }))));
        session
            .login(&LoginRequest::new("admin", "password123"))
            .await
            .unwrap();
        assert_eq!(session.snapshot().user.map(|u| u.id), Some(1));

        http.reply(Err(ClientError::Unauthorized("expired".into())));
        assert!(session.current_user().await.is_err());
        assert_eq!(session.snapshot(), Session::anonymous());
        assert!(tokens.get().is_none());
    }

    #[tokio::test]
    async fn test_logout_ignores_server_failure() {
        let (http, tokens, session) = store();
        login_reply(&http);
        session
            .login(&LoginRequest::new("admin", "password123"))
            .await
            .unwrap();

        http.reply(Err(ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, "down")));
        session.logout().await;

        assert_eq!(session.snapshot(), Session::anonymous());
        assert!(tokens.get().is_none());
        assert!(!session.is_admin());
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_rejected() {
        let (http, _, session) = store();
        let err = session.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_ends_session_when_new_token_cannot_be_stored() {
        let http = Arc::new(FakeHttp::new());
        let tokens = Arc::new(LockableTokenStore::default());
        let session = SessionStore::new(http.clone(), tokens.clone());
        login_reply(&http);
        session
            .login(&LoginRequest::new("admin", "password123"))
            .await
            .unwrap();
        assert_eq!(session.snapshot().refresh_token.as_deref(), Some("ref1"));

        tokens.locked.store(true, Ordering::SeqCst);
        http.reply_data(json!({
            "accessToken": "tok2",
            "refreshToken": "ref2",
            "username": "admin",
            "email": "a@x.com",
            "role": "ADMIN"
        }));
        let err = session.refresh_access_token().await.unwrap_err();

        assert!(matches!(err, ClientError::Storage(_)));
        assert_eq!(session.snapshot(), Session::anonymous());
        assert!(tokens.get().is_none());
    }

    #[tokio::test]
    async fn test_reset_handle_resets_synchronously() {
        let (http, tokens, session) = store();
        login_reply(&http);
        session
            .login(&LoginRequest::new("admin", "password123"))
            .await
            .unwrap();

        let handler: Arc<dyn UnauthorizedHandler> = Arc::new(session.reset_handle());
        handler.on_unauthorized("/employees");

        assert_eq!(session.snapshot(), Session::anonymous());
        assert!(tokens.get().is_none());
    }

    #[tokio::test]
    async fn test_reset_handle_outlives_session() {
        let (_, tokens, session) = store();
        tokens.set("tok1").unwrap();
        let reset = session.reset_handle();
        drop(session);

        reset.reset();
        assert!(tokens.get().is_none());
    }

    #[tokio::test]
    async fn test_auth_event_resets_session() {
        let (http, _, session) = store();
        login_reply(&http);
        session
            .login(&LoginRequest::new("admin", "password123"))
            .await
            .unwrap();

        let (tx, rx) = broadcast::channel(4);
        let handle = session.listen_for_auth_events(rx);
        let mut changes = session.subscribe();

        tx.send(AuthEvent::Unauthorized {
            path: "/employees".into(),
        })
        .unwrap();
        changes.changed().await.unwrap();
        assert!(!session.snapshot().is_authenticated);

        drop(tx);
        handle.await.unwrap();
    }
}
