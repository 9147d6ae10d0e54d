//! Session invalidation on unauthorized responses.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use weknora_core::ErrorEnvelope;
use weknora_session::SessionStore;

use crate::config::ClientConfig;
use crate::normalize::{LOGIN_MESSAGE_RULES, resolve_message};

/// Performs the navigation to the login surface.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator for headless processes: records the transition in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path, "session ended, sign-in required");
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardState {
    Active,
    /// The one navigation has happened; terminal for this guard.
    Redirecting,
}

/// Reacts to 401 responses: clears the session on every one, and navigates to
/// the login surface at most once per guard.
pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    login_paths: Vec<String>,
    login_redirect: String,
    redirected: AtomicBool,
}

impl SessionGuard {
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            navigator,
            login_paths: config.login_paths().to_vec(),
            login_redirect: config.login_redirect().to_string(),
            redirected: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn state(&self) -> GuardState {
        if self.redirected.load(Ordering::Acquire) {
            GuardState::Redirecting
        } else {
            GuardState::Active
        }
    }

    /// Whether `path` targets the login endpoint: the path (query ignored)
    /// ends with one of the configured login paths on a segment boundary.
    pub fn is_login_request(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path).trim_end_matches('/');

        self.login_paths.iter().any(|login| {
            let login = login.trim_end_matches('/');
            let Some(prefix) = path.strip_suffix(login) else {
                return false;
            };
            !login.is_empty() && (login.starts_with('/') || prefix.is_empty() || prefix.ends_with('/'))
        })
    }

    /// Handle a 401 for the request to `path` and return the caller's error.
    ///
    /// A failed login only reports the credentials problem. Any other 401
    /// wipes the session, and the first one also navigates to login.
    pub fn on_unauthorized(&self, path: &str, body: &Value) -> ErrorEnvelope {
        if self.is_login_request(path) {
            tracing::debug!(path, "login rejected");
            return ErrorEnvelope::login_rejected(resolve_message(body, LOGIN_MESSAGE_RULES));
        }

        if let Err(err) = self.store.clear() {
            tracing::error!(error = %err, "failed to clear session after 401");
        }

        if self
            .redirected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::warn!(path, redirect = %self.login_redirect, "session expired, redirecting to login");
            self.navigator.navigate(&self.login_redirect);
        } else {
            tracing::debug!(path, "session expired, redirect already in progress");
        }

        ErrorEnvelope::session_expired()
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("login_paths", &self.login_paths)
            .field("login_redirect", &self.login_redirect)
            .field("state", &self.state())
            .finish()
    }
}
