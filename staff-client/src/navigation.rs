//! Navigation side effects
//!
//! The HTTP client does not know about views. On a 401 it runs every
//! registered [`UnauthorizedHandler`] before returning, asks the
//! [`Navigator`] to show the login view and broadcasts an [`AuthEvent`]
//! for any other observer.

use std::sync::{Mutex, PoisonError};

/// Moves the user interface to another location
pub trait Navigator: Send + Sync + std::fmt::Debug {
    fn navigate(&self, location: &str);
}

/// Navigator for headless use; navigation requests are only logged
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, location: &str) {
        tracing::debug!(location, "Navigation requested (no view attached)");
    }
}

/// Navigator that records every requested location
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(location.to_string());
    }
}

/// Reacts to a 401 on the calling thread, before the failing request returns
pub trait UnauthorizedHandler: Send + Sync + std::fmt::Debug {
    fn on_unauthorized(&self, path: &str);
}

/// Authentication events published by the HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A request was answered with 401; the stored token is already gone
    Unauthorized {
        /// Path of the request that failed
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator() {
        let nav = RecordingNavigator::new();
        assert!(nav.last().is_none());

        nav.navigate("/login");
        nav.navigate("/employees");
        assert_eq!(nav.history(), vec!["/login", "/employees"]);
        assert_eq!(nav.last().as_deref(), Some("/employees"));
    }
}
