//! Route guard
//!
//! Decides what a protected view renders for the current session. Pure
//! function of the session snapshot; no I/O, never fails.

use shared::models::UserRole;

use crate::config::DEFAULT_LOGIN_PATH;
use crate::session::Session;

/// What a protected view should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still initializing
    Loading,
    /// Not logged in; `from` is where to return after login
    RedirectToLogin { to: String, from: String },
    /// Logged in without the required role
    AccessDenied,
    /// Render the requested content
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    login_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PATH)
    }
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn check(
        &self,
        session: &Session,
        requested: &str,
        required_role: Option<UserRole>,
    ) -> GuardDecision {
        if session.is_loading {
            return GuardDecision::Loading;
        }
        if !session.is_authenticated {
            return GuardDecision::RedirectToLogin {
                to: self.login_path.clone(),
                from: requested.to_string(),
            };
        }
        match required_role {
            Some(role) if !session.has_role(role) => GuardDecision::AccessDenied,
            _ => GuardDecision::Allow,
        }
    }
}
