//! Client facade
//!
//! [`StaffClient`] wires one HTTP client, one token slot and one session
//! together. Create it once and hand out references; stores built from it
//! share its connection pool and token.

use std::sync::Arc;

use crate::http::NetworkHttpClient;
use crate::navigation::{Navigator, NoopNavigator};
use crate::session::SessionStore;
use crate::store::{DepartmentStore, DepartmentView, EmployeeStore};
use crate::token::{FileTokenStore, MemoryTokenStore, TokenStore};
use crate::{ClientConfig, ClientResult, RouteGuard};

/// Builder for [`StaffClient`]
#[derive(Debug)]
pub struct StaffClientBuilder {
    config: ClientConfig,
    tokens: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl StaffClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            tokens: None,
            navigator: None,
        }
    }

    /// Use this token slot instead of the one derived from the config
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Receive the redirect to the login view on 401
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build the client
    ///
    /// The session is registered with the HTTP client, so a 401 from any
    /// call leaves it anonymous by the time that call returns.
    pub fn build(self) -> ClientResult<StaffClient> {
        let tokens = self.tokens.unwrap_or_else(|| match &self.config.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::new()),
        });
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator));

        let http = Arc::new(NetworkHttpClient::with_parts(
            &self.config,
            Arc::clone(&tokens),
            navigator,
        )?);
        let session = SessionStore::new(Arc::clone(&http), tokens);
        http.add_unauthorized_handler(Arc::new(session.reset_handle()));

        tracing::debug!(base_url = %http.base_url(), "Staff client ready");
        Ok(StaffClient {
            guard: RouteGuard::new(&self.config.login_path),
            config: self.config,
            http,
            session,
        })
    }
}

/// Entry point shared by every view
pub struct StaffClient {
    config: ClientConfig,
    http: Arc<NetworkHttpClient>,
    session: SessionStore,
    guard: RouteGuard,
}

impl StaffClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> StaffClientBuilder {
        StaffClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> Arc<NetworkHttpClient> {
        Arc::clone(&self.http)
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// A fresh employee store; clones of it share state
    pub fn employees(&self) -> EmployeeStore {
        EmployeeStore::new(self.http())
    }

    pub fn departments(&self, view: DepartmentView) -> DepartmentStore {
        DepartmentStore::new(self.http(), view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_build_outside_runtime() {
        let client = StaffClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.guard().login_path(), "/login");
        assert!(client.http().token_store().get().is_none());
    }

    #[test]
    fn test_token_file_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token.json");
        FileTokenStore::new(&path).set("persisted").unwrap();

        let client = StaffClient::new(ClientConfig::default().with_token_file(&path)).unwrap();
        assert_eq!(client.http().token_store().get().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_auth_listener_ends_with_client() {
        let client = StaffClient::new(ClientConfig::default()).unwrap();
        let listener = client
            .session()
            .listen_for_auth_events(client.http().subscribe());

        drop(client);
        tokio::time::timeout(Duration::from_secs(5), listener)
            .await
            .expect("listener kept running after the client was dropped")
            .unwrap();
    }
}
