//! Test doubles for the ports.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use rolegate_domain::{AuthError, RefreshToken, RequestSpec, ResponseSpec, Session, TokenGrant};
use tokio::sync::Barrier;

use crate::ports::{HttpClient, HttpClientError, SessionStorage, SessionStorageError, TokenExchange};

/// Builds a JWT-shaped access token whose payload carries `role` and a
/// `jti` that makes each token distinct.
pub fn jwt(jti: &str, role: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"role":"{role}","jti":"{jti}"}}"#));
    format!("{header}.{payload}.sig")
}

/// `Authorization` header value for a raw token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

type LoginFn = dyn Fn(&str, &str) -> Result<TokenGrant, AuthError> + Send + Sync;
type RefreshFn = dyn Fn(&RefreshToken) -> Result<TokenGrant, AuthError> + Send + Sync;

/// Scripted token endpoint that counts refresh exchanges.
pub struct FakeExchange {
    login: Box<LoginFn>,
    refresh: Box<RefreshFn>,
    refresh_delay: Option<Duration>,
    hang: bool,
    refresh_calls: AtomicUsize,
    refreshed_with: Mutex<Vec<RefreshToken>>,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self {
            login: Box::new(|_, _| {
                Err(AuthError::Rejected {
                    message: "login not scripted".to_string(),
                })
            }),
            refresh: Box::new(|_| {
                Err(AuthError::RefreshRejected {
                    message: "refresh not scripted".to_string(),
                })
            }),
            refresh_delay: None,
            hang: false,
            refresh_calls: AtomicUsize::new(0),
            refreshed_with: Mutex::new(Vec::new()),
        }
    }

    pub fn with_login<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<TokenGrant, AuthError> + Send + Sync + 'static,
    {
        self.login = Box::new(f);
        self
    }

    pub fn with_refresh<F>(mut self, f: F) -> Self
    where
        F: Fn(&RefreshToken) -> Result<TokenGrant, AuthError> + Send + Sync + 'static,
    {
        self.refresh = Box::new(f);
        self
    }

    /// Delays every refresh answer.
    pub const fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    /// Never answers refresh calls.
    pub const fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refreshed_with(&self) -> Vec<RefreshToken> {
        self.refreshed_with.lock().clone()
    }
}

#[async_trait]
impl TokenExchange for FakeExchange {
    async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenGrant, AuthError> {
        (self.login)(username, password)
    }

    async fn refresh_grant(&self, refresh_token: &RefreshToken) -> Result<TokenGrant, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refreshed_with.lock().push(refresh_token.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        (self.refresh)(refresh_token)
    }
}

/// In-memory session storage with failure injection.
#[derive(Default)]
pub struct MemoryStorage {
    session: Mutex<Option<Session>>,
    fail_clear: AtomicBool,
    save_delay: Mutex<Option<Duration>>,
}

impl MemoryStorage {
    pub fn current(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    pub fn put(&self, session: Session) {
        *self.session.lock() = Some(session);
    }

    pub fn fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }

    /// Makes every later save wait before it stores, like a slow disk.
    pub fn delay_saves(&self, delay: Duration) {
        *self.save_delay.lock() = Some(delay);
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<Session>, SessionStorageError> {
        Ok(self.current())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStorageError> {
        let delay = *self.save_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.put(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStorageError> {
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(SessionStorageError::Io(std::io::Error::other(
                "storage unavailable",
            )));
        }
        self.session.lock().take();
        Ok(())
    }
}

type Responder = dyn Fn(&RequestSpec) -> Result<ResponseSpec, HttpClientError> + Send + Sync;

/// Scripted resource server that records every request it receives.
pub struct FakeHttp {
    respond: Box<Responder>,
    gate: Option<(String, Arc<Barrier>)>,
    requests: Mutex<Vec<RequestSpec>>,
}

impl FakeHttp {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&RequestSpec) -> Result<ResponseSpec, HttpClientError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers `200 []` to `accepted` bearer tokens and `401` to everything else.
    pub fn accepting(accepted: &[&str]) -> Self {
        let accepted: Vec<String> = accepted.iter().map(|t| bearer(t)).collect();
        Self::new(move |request| {
            let authorized = request
                .authorization()
                .is_some_and(|value| accepted.iter().any(|a| a == value));
            if authorized {
                Ok(ResponseSpec::json(200, &serde_json::json!([])))
            } else {
                Ok(ResponseSpec::empty(401))
            }
        })
    }

    /// Holds requests carrying `authorization` until `parties` of them arrived.
    pub fn with_gate(mut self, authorization: String, parties: usize) -> Self {
        self.gate = Some((authorization, Arc::new(Barrier::new(parties))));
        self
    }

    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests.lock().clone()
    }

    /// `Authorization` values of all received requests, in arrival order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.authorization().map(String::from))
            .collect()
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        self.requests.lock().push(request.clone());
        if let Some((authorization, barrier)) = &self.gate
            && request.authorization() == Some(authorization.as_str())
        {
            barrier.wait().await;
        }
        (self.respond)(request)
    }
}
