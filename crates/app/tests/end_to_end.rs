//! End-to-end tests against an in-process stand-in for the API server.
//!
//! The stand-in issues JWT-shaped access tokens with a `role` claim, rotates
//! refresh tokens on every refresh, and can expire all access tokens at
//! once to force the refresh path.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use rolegate::{CliError, Command, run};
use rolegate_application::{ClientError, RolegateClient, SessionState};
use rolegate_domain::{NewManagedUser, Role};
use rolegate_infrastructure::ClientConfig;

#[derive(Default)]
struct ServerState {
    issued: AtomicUsize,
    refreshes: AtomicUsize,
    /// Valid access tokens and their role.
    access: Mutex<HashMap<String, String>>,
    /// Valid refresh tokens and their role.
    refresh: Mutex<HashMap<String, String>>,
    users: Mutex<Vec<serde_json::Value>>,
}

impl ServerState {
    fn issue(&self, role: &str) -> serde_json::Value {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"role":"{role}","jti":"A{n}"}}"#));
        let access = format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig");
        let refresh = format!("R{n}");
        self.access.lock().insert(access.clone(), role.to_string());
        self.refresh.lock().insert(refresh.clone(), role.to_string());
        json!({
            "access_token": access,
            "refresh_token": refresh,
            "token_type": "Bearer",
            "expires_in": 7200
        })
    }

    fn expire_access_tokens(&self) {
        self.access.lock().clear();
    }

    fn revoke_refresh_tokens(&self) {
        self.refresh.lock().clear();
    }

    fn role_for(&self, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.access.lock().get(token).cloned()
    }
}

type Shared = Arc<ServerState>;

fn oauth_error(status: StatusCode, error: &str, description: &str) -> Response {
    (
        status,
        Json(json!({"error": error, "error_description": description})),
    )
        .into_response()
}

async fn token(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    if form.get("client_id").map(String::as_str) != Some("TestClient") {
        return oauth_error(StatusCode::UNAUTHORIZED, "invalid_client", "Unknown client");
    }
    match form.get("grant_type").map(String::as_str) {
        Some("password") => {
            let role = match (
                form.get("username").map(String::as_str),
                form.get("password").map(String::as_str),
            ) {
                (Some("a@x.com"), Some("pw")) => "admin",
                (Some("u@x.com"), Some("pw")) => "user",
                _ => {
                    return oauth_error(
                        StatusCode::BAD_REQUEST,
                        "invalid_grant",
                        "Invalid email or password",
                    );
                }
            };
            Json(state.issue(role)).into_response()
        }
        Some("refresh_token") => {
            state.refreshes.fetch_add(1, Ordering::SeqCst);
            let presented = form.get("refresh_token").cloned().unwrap_or_default();
            // Refresh tokens are single use.
            let Some(role) = state.refresh.lock().remove(&presented) else {
                return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "Refresh token revoked");
            };
            Json(state.issue(&role)).into_response()
        }
        _ => oauth_error(StatusCode::BAD_REQUEST, "unsupported_grant_type", "Unsupported"),
    }
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if state.role_for(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.users.lock().clone()).into_response()
}

async fn create_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    match state.role_for(&headers).as_deref() {
        None => StatusCode::UNAUTHORIZED.into_response(),
        Some("admin") => {
            let mut users = state.users.lock();
            let attrs = &body["managed_user"];
            let user = json!({"id": users.len() + 1, "email": attrs["email"], "role": attrs["role"]});
            users.push(user.clone());
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Some(_) => (StatusCode::FORBIDDEN, Json(json!({"error": "Admins only"}))).into_response(),
    }
}

struct Harness {
    state: Shared,
    config: ClientConfig,
    _dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let state = Shared::default();
        state.users.lock().push(json!({"id": 1, "email": "a@x.com", "role": "admin"}));

        let app = Router::new()
            .route("/oauth/token", post(token))
            .route("/api/managed_users", get(list_users).post(create_user))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            base_url: format!("http://{addr}"),
            session_file: Some(dir.path().join("session.json")),
            refresh_timeout_secs: 5,
            ..ClientConfig::default()
        };
        Self {
            state,
            config,
            _dir: dir,
        }
    }

    fn client(&self) -> RolegateClient {
        self.config.build_client().unwrap()
    }

    async fn cli(&self, command: Command) -> Result<String, CliError> {
        let mut out = Vec::new();
        run(&self.client(), command, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn refreshes(&self) -> usize {
        self.state.refreshes.load(Ordering::SeqCst)
    }
}

fn login(email: &str) -> Command {
    Command::Login {
        email: email.to_string(),
        password: "pw".to_string(),
    }
}

#[tokio::test]
async fn test_admin_login_then_list_users() {
    let h = Harness::start().await;

    let out = h.cli(login("a@x.com")).await.unwrap();
    assert_eq!(out, "Signed in as a@x.com (admin)\n");

    let out = h.cli(Command::Users).await.unwrap();
    assert!(out.contains("a@x.com"));
    assert!(out.contains("admin"));
    assert_eq!(h.refreshes(), 0);
}

#[tokio::test]
async fn test_wrong_password_reports_server_reason() {
    let h = Harness::start().await;

    let err = h
        .cli(Command::Login {
            email: "a@x.com".to_string(),
            password: "nope".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "authentication failed: credentials rejected: Invalid email or password"
    );
    assert!(!h.config.session_file.as_ref().unwrap().exists());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_across_restarts() {
    let h = Harness::start().await;
    h.cli(login("a@x.com")).await.unwrap();
    h.state.expire_access_tokens();

    // A fresh process restores the persisted, now expired, session.
    let out = h.cli(Command::Users).await.unwrap();

    assert!(out.contains("a@x.com"));
    assert_eq!(h.refreshes(), 1);

    // The rotated pair was persisted: the next process needs no refresh.
    h.cli(Command::Users).await.unwrap();
    assert_eq!(h.refreshes(), 1);
}

#[tokio::test]
async fn test_concurrent_expired_requests_share_one_refresh() {
    let h = Harness::start().await;
    let client = h.client();
    client.login("a@x.com", "pw").await.unwrap();
    h.state.expire_access_tokens();

    let users = client.managed_users();
    let (a, b, c) = tokio::join!(users.list(), users.list(), users.list());

    for result in [a, b, c] {
        assert_eq!(result.unwrap().len(), 1);
    }
    assert_eq!(h.refreshes(), 1);
    assert_eq!(client.refresher().cycles(), 1);
}

#[tokio::test]
async fn test_revoked_refresh_token_signs_out() {
    let h = Harness::start().await;
    h.cli(login("u@x.com")).await.unwrap();
    h.state.expire_access_tokens();
    h.state.revoke_refresh_tokens();

    let err = h.cli(Command::Users).await.unwrap_err();

    assert!(err.requires_login());
    assert!(matches!(err, CliError::Client(ClientError::Authentication(_))));
    assert!(!h.config.session_file.as_ref().unwrap().exists());
    assert_eq!(h.cli(Command::WhoAmI).await.unwrap(), "Not signed in\n");
}

#[tokio::test]
async fn test_non_admin_gets_data_but_list_is_not_rendered() {
    let h = Harness::start().await;
    let client = h.client();
    client.login("u@x.com", "pw").await.unwrap();

    // The server answers; only rendering is gated client-side.
    assert_eq!(client.managed_users().list().await.unwrap().len(), 1);

    let out = h.cli(Command::Users).await.unwrap();
    assert_eq!(out, "The user list is available to admins only.\n");
}

#[tokio::test]
async fn test_create_user_is_enforced_by_server() {
    let h = Harness::start().await;
    let new_user = NewManagedUser::new("b@x.com", "secret", Role::new("user"));

    h.cli(login("u@x.com")).await.unwrap();
    let err = h.cli(Command::CreateUser(new_user.clone())).await.unwrap_err();
    assert!(matches!(
        err,
        CliError::Client(ClientError::Authorization { .. })
    ));

    h.cli(login("a@x.com")).await.unwrap();
    let out = h.cli(Command::CreateUser(new_user)).await.unwrap();
    assert_eq!(out, "Created user b@x.com (user) with id 2\n");
}

#[tokio::test]
async fn test_logout_forgets_session() {
    let h = Harness::start().await;
    h.cli(login("a@x.com")).await.unwrap();
    assert_eq!(h.cli(Command::WhoAmI).await.unwrap(), "Signed in (admin)\n");

    assert_eq!(h.cli(Command::Logout).await.unwrap(), "Signed out\n");

    assert!(!h.config.session_file.as_ref().unwrap().exists());
    let client = h.client();
    client.restore_session().await.unwrap();
    assert_eq!(client.state(), SessionState::Anonymous);
    assert!(matches!(
        h.cli(Command::Users).await.unwrap_err(),
        CliError::NotSignedIn
    ));
}
