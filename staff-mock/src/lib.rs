//! Staff Mock - in-memory backend for the staff management API
//!
//! Serves the same REST contract as the production backend from memory,
//! seeded with an `admin/password123` administrator, a `user/password123`
//! account and a small organisation. Used by integration tests and for
//! local development without a database.

pub mod api;
pub mod error;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub use error::{MockError, MockResult};
pub use state::{MockState, Store};

/// A running mock server
pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Base URL including the `/api` prefix
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Invalidate every issued token; the next protected call answers 401
    pub async fn revoke_all_tokens(&self) {
        self.state.store.write().await.revoke_all();
    }

    /// Delay answers to searches for exactly `term`
    pub async fn set_search_delay(&self, term: impl Into<String>, delay: Duration) {
        self.state.set_search_delay(term, delay).await;
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a seeded server on an ephemeral localhost port
pub async fn spawn() -> anyhow::Result<MockBackend> {
    spawn_with_state(Arc::new(MockState::default())).await
}

pub async fn spawn_with_state(state: Arc<MockState>) -> anyhow::Result<MockBackend> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = api::router(Arc::clone(&state));
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Mock server stopped");
        }
    });
    tracing::debug!(%addr, "Mock server listening");
    Ok(MockBackend {
        addr,
        state,
        handle,
    })
}

/// Serve until the process is stopped
pub async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let app = api::router(Arc::new(MockState::default()));
    tracing::info!(addr = %listener.local_addr()?, "Staff mock backend listening");
    axum::serve(listener, app).await?;
    Ok(())
}
