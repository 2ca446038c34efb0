//! Shared setup: a seeded mock backend plus a client pointed at it

#![allow(dead_code)]

use std::sync::Arc;

use staff_client::{ClientConfig, LoginRequest, RecordingNavigator, StaffClient, TokenStore};
use staff_mock::MockBackend;

pub struct Harness {
    pub client: StaffClient,
    pub navigator: Arc<RecordingNavigator>,
    pub backend: MockBackend,
}

impl Harness {
    pub fn token(&self) -> Option<String> {
        self.client.http().token_store().get()
    }
}

pub async fn harness() -> Harness {
    harness_with(|config| config).await
}

pub async fn harness_with(configure: impl FnOnce(ClientConfig) -> ClientConfig) -> Harness {
    let backend = staff_mock::spawn().await.unwrap();
    let config = configure(ClientConfig::new(backend.base_url()).with_timeout(5));
    let navigator = Arc::new(RecordingNavigator::new());
    let client = StaffClient::builder(config)
        .navigator(navigator.clone())
        .build()
        .unwrap();
    client.session().initialize();
    Harness {
        client,
        navigator,
        backend,
    }
}

/// Harness already logged in as the seeded administrator
pub async fn admin() -> Harness {
    let harness = harness().await;
    harness
        .client
        .session()
        .login(&LoginRequest::new("admin", "password123"))
        .await
        .unwrap();
    harness
}
