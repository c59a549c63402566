//! Client facade wiring the token lifecycle together.

use std::sync::Arc;
use std::time::Duration;

use rolegate_domain::{RequestSpec, ResponseSpec, Session};
use tokio::sync::broadcast;

use crate::auth::{
    AuthenticatedTransport, RefreshCoordinator, SessionBoundary, SessionEvent, SessionState,
    TokenStore,
};
use crate::error::ClientResult;
use crate::ports::{HttpClient, SessionStorage, TokenExchange};
use crate::use_cases::ManagedUsers;

/// Default bound on a single refresh exchange.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for [`RolegateClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// How long a refresh exchange may take before all waiters are rejected.
    pub refresh_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

/// An API client holding one user session.
///
/// Cheap to clone; clones share the session and the refresh state.
#[derive(Debug, Clone)]
pub struct RolegateClient {
    session: Arc<SessionBoundary>,
    refresher: RefreshCoordinator,
    transport: AuthenticatedTransport,
}

impl RolegateClient {
    /// Wires a client from its three collaborators.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        exchange: Arc<dyn TokenExchange>,
        storage: Arc<dyn SessionStorage>,
        settings: ClientSettings,
    ) -> Self {
        let session = Arc::new(SessionBoundary::new(TokenStore::new(), storage, exchange));
        let refresher = RefreshCoordinator::new(session.clone(), settings.refresh_timeout);
        let transport = AuthenticatedTransport::new(http, refresher.clone(), session.clone());
        Self {
            session,
            refresher,
            transport,
        }
    }

    /// See [`SessionBoundary::login`].
    ///
    /// # Errors
    ///
    /// Fails when the credentials are rejected or the session cannot be stored.
    pub async fn login(&self, identifier: &str, secret: &str) -> ClientResult<Session> {
        self.session.login(identifier, secret).await
    }

    /// See [`SessionBoundary::logout`].
    ///
    /// # Errors
    ///
    /// Fails when the persisted session cannot be removed.
    pub async fn logout(&self) -> ClientResult<()> {
        self.session.logout().await
    }

    /// See [`SessionBoundary::restore_session`].
    ///
    /// # Errors
    ///
    /// Fails when the persisted session cannot be read.
    pub async fn restore_session(&self) -> ClientResult<Option<Session>> {
        self.session.restore_session().await
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Subscribe to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// See [`AuthenticatedTransport::send`].
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedTransport::send`].
    pub async fn send(&self, request: RequestSpec) -> ClientResult<ResponseSpec> {
        self.transport.send(request).await
    }

    /// Managed users resource.
    #[must_use]
    pub fn managed_users(&self) -> ManagedUsers {
        ManagedUsers::new(self.transport.clone())
    }

    /// The refresh coordinator.
    #[must_use]
    pub const fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    /// The token store.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        self.session.tokens()
    }

    /// The session boundary.
    #[must_use]
    pub fn session(&self) -> &SessionBoundary {
        &self.session
    }
}
