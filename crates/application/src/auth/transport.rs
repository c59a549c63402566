//! Authenticated request path.
//!
//! Every outgoing request is stamped with the current access token. A `401`
//! triggers one refresh through the coordinator and one retry; any other
//! response, successful or not, is returned as-is.

use std::sync::Arc;

use rolegate_domain::{AccessToken, RequestSpec, ResponseSpec};
use tracing::{debug, warn};

use super::{LogoutReason, RefreshCoordinator, SessionBoundary, TokenStore};
use crate::error::{ClientError, ClientResult};
use crate::ports::HttpClient;

#[derive(Debug, Clone, Copy)]
enum Attempt {
    First,
    Retry,
}

impl Attempt {
    const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Retry => "retry",
        }
    }
}

/// Sends requests with the bearer token attached and recovers from expired
/// access tokens.
#[derive(Clone)]
pub struct AuthenticatedTransport {
    http: Arc<dyn HttpClient>,
    tokens: TokenStore,
    refresher: RefreshCoordinator,
    session: Arc<SessionBoundary>,
}

impl std::fmt::Debug for AuthenticatedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("refresher", &self.refresher)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedTransport {
    /// Creates a transport over `http`, reading tokens from the session's store.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        refresher: RefreshCoordinator,
        session: Arc<SessionBoundary>,
    ) -> Self {
        Self {
            http,
            tokens: session.tokens().clone(),
            refresher,
            session,
        }
    }

    /// Sends `request`, refreshing the access token and retrying once if the
    /// server answers `401`.
    ///
    /// # Errors
    ///
    /// - `ClientError::Request` if the request is malformed
    /// - `ClientError::Network` if no response was received
    /// - `ClientError::Authentication` if the refresh failed
    /// - `ClientError::RetryExhausted` if the retry was rejected as well
    ///
    /// The last two leave the client anonymous.
    pub async fn send(&self, request: RequestSpec) -> ClientResult<ResponseSpec> {
        request.validate()?;

        let token = self.tokens.get();
        let response = self.dispatch(&request, token.as_ref(), Attempt::First).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        let fresh = self.refresher.ensure_newer_than(token.as_ref()).await?;
        let retried = self.dispatch(&request, Some(&fresh), Attempt::Retry).await?;
        if !retried.is_unauthorized() {
            return Ok(retried);
        }

        warn!(
            method = %request.method,
            path = %request.path,
            request_id = %request.id,
            "request rejected with a freshly refreshed token"
        );
        if let Err(e) = self.session.terminate(LogoutReason::RetryExhausted).await {
            warn!(error = %e, "session storage not cleared");
        }
        Err(ClientError::RetryExhausted)
    }

    async fn dispatch(
        &self,
        request: &RequestSpec,
        token: Option<&AccessToken>,
        attempt: Attempt,
    ) -> ClientResult<ResponseSpec> {
        let outgoing = request.authorized(token);
        let response = self.http.execute(&outgoing).await.inspect_err(|e| {
            warn!(
                method = %request.method,
                path = %request.path,
                request_id = %request.id,
                error = %e,
                "request failed"
            );
        })?;

        debug!(
            method = %request.method,
            path = %request.path,
            request_id = %request.id,
            attempt = attempt.as_str(),
            status = response.status.as_u16(),
            "response received"
        );
        Ok(response)
    }
}
