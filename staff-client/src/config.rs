//! Client configuration

use std::path::PathBuf;

/// Default REST prefix, matching the nginx proxy layout
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Default location of the login view
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Client configuration for connecting to the staff management backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server base URL including the `/api` prefix (e.g., "http://localhost:8080/api")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Where to send the user when a call comes back 401
    pub login_path: String,

    /// File used to persist the access token across restarts (memory-only when unset)
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 10,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            token_file: None,
        }
    }

    /// Load configuration from the environment (and `.env` when present)
    ///
    /// - `STAFF_API_BASE_URL`
    /// - `STAFF_API_TIMEOUT_SECS`
    /// - `STAFF_LOGIN_PATH`
    /// - `STAFF_TOKEN_FILE`
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("STAFF_API_BASE_URL").unwrap_or(defaults.base_url),
            timeout: lookup("STAFF_API_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout),
            login_path: lookup("STAFF_LOGIN_PATH").unwrap_or(defaults.login_path),
            token_file: lookup("STAFF_TOKEN_FILE").map(PathBuf::from),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the login view location
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Persist the access token in a file
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
