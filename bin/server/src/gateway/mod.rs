//! The session gateway: authentication state machine over five routes.
//!
//! States are `Anonymous`, `PendingAuth` (redirected to the provider,
//! awaiting the callback), and `Authenticated`. The routes drive the
//! transitions:
//!
//! - `/login` captures the caller's `next` destination into the OAuth
//!   `state` parameter and redirects to the provider.
//! - `/callback` completes or aborts the login and establishes the session.
//! - `/logout` clears the session and hands off to the provider logout.
//! - `/protected` is the gated resource; unauthorized access is what
//!   starts a fresh login, remembering the destination.
//! - `/` routes by authentication state.
//!
//! Every transition records exactly one audit event before the response.

pub mod client_ip;
pub mod routes;
pub mod store;

pub use client_ip::ClientIp;
pub use routes::router;
pub use store::SessionStore;

use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use gatehouse_access::AuditLog;

use crate::config::SessionConfig;
use crate::provider::IdentityProvider;

/// Shared application state, built once at startup.
pub struct AppState {
    /// Client for the external identity provider.
    pub provider: Arc<dyn IdentityProvider>,
    /// Audit sink; every handler records through this.
    pub audit: Arc<dyn AuditLog>,
    /// Key for signing session cookies.
    cookie_key: Key,
    /// Session cookie settings.
    session: SessionConfig,
    /// `returnTo` target for the provider logout.
    home_url: String,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        audit: Arc<dyn AuditLog>,
        cookie_key: Key,
        session: SessionConfig,
        home_url: String,
    ) -> Self {
        Self {
            provider,
            audit,
            cookie_key,
            session,
            home_url,
        }
    }

    /// Returns the cookie-signing key.
    #[must_use]
    pub fn cookie_key(&self) -> Key {
        self.cookie_key.clone()
    }

    /// Returns the session cookie settings.
    #[must_use]
    pub fn session_settings(&self) -> &SessionConfig {
        &self.session
    }

    /// Returns the home URL used as the post-logout `returnTo`.
    #[must_use]
    pub fn home_url(&self) -> &str {
        &self.home_url
    }
}
