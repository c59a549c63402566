//! In-memory credential storage.
//!
//! The token store is the single source of truth for the `Authorization`
//! header. It holds the whole session and replaces it in one step, so a
//! reader never observes an access token paired with a stale refresh token.

use std::sync::Arc;

use parking_lot::RwLock;
use rolegate_domain::{AccessToken, RefreshToken, Role, Session};

/// Thread-safe in-memory credential store.
///
/// Clones share the same underlying session. The lock is never held across
/// an `.await`.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    session: Arc<RwLock<Option<Session>>>,
}

impl TokenStore {
    /// Create an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current access token, if any.
    #[must_use]
    pub fn get(&self) -> Option<AccessToken> {
        self.session.read().as_ref().map(|s| s.access_token.clone())
    }

    /// Get the current refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.session.read().as_ref().map(|s| s.refresh_token.clone())
    }

    /// Get the role of the current session, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session.read().as_ref().map(|s| s.role.clone())
    }

    /// Get a copy of the whole session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Replace the stored session. Visible to every subsequent read.
    pub fn set(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    /// Remove the stored session, returning it.
    pub fn clear(&self) -> Option<Session> {
        self.session.write().take()
    }

    /// Returns true if a session is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }
}
