//! Session boundary: login, logout and restore.
//!
//! The session boundary is the only component that writes or clears the
//! persisted session. The refresh coordinator hands it refreshed sessions to
//! commit and asks it to end the session when a refresh fails.
//!
//! Every change to the held session goes through one async lock, held
//! across the memory update and the storage call, so memory and storage
//! always end up describing the same session.

use std::sync::Arc;

use rolegate_domain::{AuthError, RefreshToken, Role, Session};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use super::TokenStore;
use crate::error::ClientResult;
use crate::ports::{SessionStorage, SessionStorageError, TokenExchange};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 32;

/// Session-level state as seen by a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No credentials are held.
    Anonymous,
    /// A session is held.
    Authenticated {
        /// Role decoded from the access token.
        role: Role,
    },
}

impl SessionState {
    /// Returns true when a session is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user logged out.
    UserRequested,
    /// The refresh exchange failed.
    RefreshFailed(AuthError),
    /// A request was still unauthorized after a successful refresh.
    RetryExhausted,
}

/// Notifications for front ends, e.g. to return to the login screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login succeeded.
    LoggedIn {
        /// Role of the new session.
        role: Role,
    },
    /// A persisted session was loaded at startup.
    Restored {
        /// Role of the restored session.
        role: Role,
    },
    /// The access token was refreshed.
    Refreshed,
    /// The session ended.
    LoggedOut {
        /// Why it ended.
        reason: LogoutReason,
    },
}

/// Owns the session lifecycle: `Anonymous → Authenticated` on login or
/// restore, `Authenticated → Anonymous` on logout or unrecoverable refresh
/// failure.
pub struct SessionBoundary {
    tokens: TokenStore,
    storage: Arc<dyn SessionStorage>,
    exchange: Arc<dyn TokenExchange>,
    events: broadcast::Sender<SessionEvent>,
    /// Serializes login, restore, refresh commits and termination.
    writes: Mutex<()>,
}

impl std::fmt::Debug for SessionBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBoundary")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl SessionBoundary {
    /// Creates a session boundary over the given store, storage and token endpoint.
    #[must_use]
    pub fn new(
        tokens: TokenStore,
        storage: Arc<dyn SessionStorage>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tokens,
            storage,
            exchange,
            events,
            writes: Mutex::new(()),
        }
    }

    /// The token store this boundary seeds.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.tokens
            .role()
            .map_or(SessionState::Anonymous, |role| SessionState::Authenticated { role })
    }

    /// Subscribe to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Logs in with the password grant and persists the new session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Authentication` when the credentials are
    /// rejected or the issued token carries no decodable role, and
    /// `ClientError::Storage` when the session cannot be persisted.
    pub async fn login(&self, identifier: &str, secret: &str) -> ClientResult<Session> {
        let grant = self
            .exchange
            .password_grant(identifier, secret)
            .await
            .inspect_err(|e| warn!(error = %e, "login rejected"))?;

        let session = Session::from_grant(grant)
            .inspect_err(|e| warn!(error = %e, "login returned an unusable token"))?;

        let _writes = self.writes.lock().await;
        self.storage.save(&session).await?;
        self.tokens.set(session.clone());

        info!(role = %session.role, token = %session.access_token.preview(), "logged in");
        self.emit(SessionEvent::LoggedIn {
            role: session.role.clone(),
        });
        Ok(session)
    }

    /// Ends the session. Clears memory first, then durable storage.
    /// Calling it while anonymous is a no-op apart from the storage clear.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the persisted session could not be
    /// removed. The in-memory session is cleared regardless.
    pub async fn logout(&self) -> ClientResult<()> {
        self.terminate(LogoutReason::UserRequested).await?;
        Ok(())
    }

    /// Loads a persisted session and seeds the token store.
    ///
    /// The token is not validated; an expired token is discovered on the
    /// first 401.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the persisted session is unreadable.
    pub async fn restore_session(&self) -> ClientResult<Option<Session>> {
        let _writes = self.writes.lock().await;
        let Some(session) = self.storage.load().await? else {
            debug!("no persisted session");
            return Ok(None);
        };

        self.tokens.set(session.clone());
        info!(role = %session.role, "session restored");
        self.emit(SessionEvent::Restored {
            role: session.role.clone(),
        });
        Ok(Some(session))
    }

    /// Performs the refresh-token exchange without committing the result.
    pub(crate) async fn exchange_refresh(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<Session, AuthError> {
        let grant = self.exchange.refresh_grant(refresh_token).await?;
        Session::from_grant(grant)
    }

    /// Installs a refreshed session, provided the session it was refreshed
    /// from is still current. Returns false when a logout or a new login
    /// happened while the exchange was in flight.
    pub(crate) async fn commit_refresh(&self, used: &RefreshToken, session: Session) -> bool {
        let _writes = self.writes.lock().await;
        if self.tokens.refresh_token().as_ref() != Some(used) {
            debug!("session changed during refresh, discarding refreshed tokens");
            return false;
        }

        self.tokens.set(session.clone());
        if let Err(e) = self.storage.save(&session).await {
            // The live session stays usable; only a restart would lose it.
            warn!(error = %e, "failed to persist refreshed session");
        }

        info!(token = %session.access_token.preview(), "access token refreshed");
        self.emit(SessionEvent::Refreshed);
        true
    }

    /// Clears the session in memory and in storage and announces the logout.
    pub(crate) async fn terminate(&self, reason: LogoutReason) -> Result<(), SessionStorageError> {
        let (had_session, cleared) = {
            let _writes = self.writes.lock().await;
            let had_session = self.tokens.clear().is_some();
            (had_session, self.storage.clear().await)
        };

        match &reason {
            LogoutReason::UserRequested => info!("logged out"),
            other => warn!(reason = ?other, "session terminated"),
        }
        if let Err(e) = &cleared {
            warn!(error = %e, "failed to remove persisted session");
        }

        if had_session {
            self.emit(SessionEvent::LoggedOut { reason });
        }
        cleared
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
