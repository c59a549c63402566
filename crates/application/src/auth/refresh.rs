//! Single-flight access token refresh.
//!
//! When several requests discover an expired token at once, exactly one
//! refresh-token exchange runs. Every caller that asks while it is running
//! becomes a pending waiter and receives that exchange's outcome.
//!
//! ```text
//!            ensure_fresh_token()
//!   Idle ─────────────────────────▶ Refreshing { pending: [caller] }
//!    ▲                                   │  ensure_fresh_token(): push waiter
//!    │      settle(outcome):             │
//!    └──── resolve/reject all waiters ◀──┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rolegate_domain::{AccessToken, AuthError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{LogoutReason, SessionBoundary};

type RefreshOutcome = Result<AccessToken, AuthError>;

/// A caller suspended until the in-flight refresh settles.
#[derive(Debug)]
pub struct PendingRequest {
    resolve: oneshot::Sender<RefreshOutcome>,
}

impl PendingRequest {
    fn new(resolve: oneshot::Sender<RefreshOutcome>) -> Self {
        Self { resolve }
    }

    fn settle(self, outcome: RefreshOutcome) {
        // The waiter may have been dropped; nothing to deliver then.
        let _ = self.resolve.send(outcome);
    }
}

/// Refresh state. At most one `Refreshing` cycle exists at a time.
#[derive(Debug, Default)]
pub enum RefreshState {
    /// No refresh is running.
    #[default]
    Idle,
    /// A refresh is running; `pending` are resolved with its outcome in
    /// arrival order.
    Refreshing {
        /// Waiters of the running cycle.
        pending: Vec<PendingRequest>,
    },
}

impl RefreshState {
    /// Returns true while a refresh is running.
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        matches!(self, Self::Refreshing { .. })
    }
}

/// How the caller came to need a token.
#[derive(Debug, Clone, Copy)]
enum Trigger<'a> {
    /// The caller asked for a fresh token outright.
    Explicit,
    /// A request sent with this token (or none) was rejected with 401.
    Rejected(Option<&'a AccessToken>),
}

struct Inner {
    state: Mutex<RefreshState>,
    session: Arc<SessionBoundary>,
    timeout: Duration,
    cycles: AtomicU64,
}

/// Coordinates refresh-token exchanges so that at most one runs at a time.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &*self.inner.state.lock())
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates a coordinator refreshing the given session, giving up on an
    /// exchange after `timeout`.
    #[must_use]
    pub fn new(session: Arc<SessionBoundary>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RefreshState::Idle),
                session,
                timeout,
                cycles: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a fresh access token, starting a refresh or joining the one
    /// in flight.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure. The session has been terminated by then.
    pub async fn ensure_fresh_token(&self) -> Result<AccessToken, AuthError> {
        self.acquire(Trigger::Explicit).await
    }

    /// Like [`ensure_fresh_token`](Self::ensure_fresh_token), for a request
    /// that was rejected after being sent with `sent_with`. If the store
    /// already holds a different token, a refresh has completed since the
    /// request was sent and that token is returned without a new exchange.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure. The session has been terminated by then.
    pub async fn ensure_newer_than(
        &self,
        sent_with: Option<&AccessToken>,
    ) -> Result<AccessToken, AuthError> {
        self.acquire(Trigger::Rejected(sent_with)).await
    }

    /// Returns true while a refresh is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.state.lock().is_refreshing()
    }

    /// Number of refresh cycles started so far.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.inner.cycles.load(Ordering::Relaxed)
    }

    async fn acquire(&self, trigger: Trigger<'_>) -> Result<AccessToken, AuthError> {
        let (tx, rx) = oneshot::channel();

        let start_cycle = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                RefreshState::Refreshing { pending } => {
                    pending.push(PendingRequest::new(tx));
                    debug!(waiters = pending.len(), "joined in-flight token refresh");
                    false
                }
                RefreshState::Idle => {
                    if let Trigger::Rejected(sent_with) = trigger {
                        let current = self.inner.session.tokens().get();
                        if let Some(current) = current
                            && Some(&current) != sent_with
                        {
                            debug!("token already replaced since the request was sent");
                            return Ok(current);
                        }
                    }
                    *state = RefreshState::Refreshing {
                        pending: vec![PendingRequest::new(tx)],
                    };
                    true
                }
            }
        };

        if start_cycle {
            let cycle = self.inner.cycles.fetch_add(1, Ordering::Relaxed) + 1;
            let coordinator = self.clone();
            tokio::spawn(async move { coordinator.run_cycle(cycle).await });
        }

        rx.await.unwrap_or(Err(AuthError::RefreshAbandoned))
    }

    async fn run_cycle(self, cycle: u64) {
        let guard = CycleGuard {
            coordinator: Some(self.clone()),
        };
        let outcome = self.exchange(cycle).await;

        if let Err(error) = &outcome
            && *error != AuthError::RefreshAbandoned
        {
            // Queued callers must observe the anonymous state once rejected.
            let _ = self
                .inner
                .session
                .terminate(LogoutReason::RefreshFailed(error.clone()))
                .await;
        }

        guard.settle(outcome);
    }

    async fn exchange(&self, cycle: u64) -> RefreshOutcome {
        let session = &self.inner.session;
        let Some(refresh_token) = session.tokens().refresh_token() else {
            warn!(cycle, "token refresh needed but no refresh token is held");
            return Err(AuthError::NoRefreshToken);
        };

        debug!(cycle, refresh_token = %refresh_token.preview(), "refreshing access token");
        let timeout = self.inner.timeout;
        let refreshed = match tokio::time::timeout(timeout, session.exchange_refresh(&refresh_token)).await
        {
            Ok(Ok(refreshed)) => refreshed,
            Ok(Err(error)) => {
                warn!(cycle, error = %error, "token refresh failed");
                return Err(error);
            }
            Err(_) => {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(cycle, timeout_ms, "token refresh timed out");
                return Err(AuthError::RefreshTimedOut { timeout_ms });
            }
        };

        let access_token = refreshed.access_token.clone();
        if session.commit_refresh(&refresh_token, refreshed).await {
            info!(cycle, "token refresh cycle completed");
            Ok(access_token)
        } else {
            Err(AuthError::RefreshAbandoned)
        }
    }

    /// Returns to `Idle` and hands `outcome` to every waiter in arrival order.
    fn settle(&self, outcome: RefreshOutcome) {
        let pending = match std::mem::take(&mut *self.inner.state.lock()) {
            RefreshState::Refreshing { pending } => pending,
            RefreshState::Idle => Vec::new(),
        };
        debug!(waiters = pending.len(), ok = outcome.is_ok(), "settling token refresh");
        for waiter in pending {
            waiter.settle(outcome.clone());
        }
    }
}

/// Settles the cycle when dropped, so waiters are rejected rather than left
/// hanging if the refresh task is cancelled or panics.
struct CycleGuard {
    coordinator: Option<RefreshCoordinator>,
}

impl CycleGuard {
    fn settle(mut self, outcome: RefreshOutcome) {
        if let Some(coordinator) = self.coordinator.take() {
            coordinator.settle(outcome);
        }
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if let Some(coordinator) = self.coordinator.take() {
            coordinator.settle(Err(AuthError::RefreshAbandoned));
        }
    }
}
