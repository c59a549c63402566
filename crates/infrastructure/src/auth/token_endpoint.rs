//! `OAuth2` token endpoint client.
//!
//! Implements the password and refresh-token grants against the
//! authorization server's token endpoint.

use async_trait::async_trait;
use reqwest::Url;
use rolegate_application::ports::TokenExchange;
use rolegate_domain::{AuthError, RefreshToken, TokenGrant};
use serde::Deserialize;
use tracing::debug;

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `OAuth2` error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn into_message(self) -> String {
        self.error_description.unwrap_or(self.error)
    }
}

/// Which grant a token request performs; decides how failures are reported.
#[derive(Debug, Clone, Copy)]
enum Grant {
    Password,
    Refresh,
}

impl Grant {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Refresh => "refresh_token",
        }
    }

    fn rejected(self, message: String) -> AuthError {
        match self {
            Self::Password => AuthError::Rejected { message },
            Self::Refresh => AuthError::RefreshRejected { message },
        }
    }
}

/// Client credentials registered with the authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// `client_id` sent with every grant.
    pub client_id: String,
    /// `client_secret` sent with every grant.
    pub client_secret: String,
}

/// Token endpoint client.
#[derive(Debug, Clone)]
pub struct OAuth2TokenEndpoint {
    http_client: reqwest::Client,
    token_url: Url,
    credentials: ClientCredentials,
}

impl OAuth2TokenEndpoint {
    /// Creates a client for the token endpoint at `token_url`.
    #[must_use]
    pub fn new(token_url: Url, credentials: ClientCredentials) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            token_url,
            credentials,
        }
    }

    /// Uses a preconfigured reqwest client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    /// The token endpoint URL.
    #[must_use]
    pub const fn token_url(&self) -> &Url {
        &self.token_url
    }

    fn form(&self, grant: Grant, extra: &[(&str, &str)]) -> Result<String, AuthError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("grant_type", grant.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        params.extend_from_slice(extra);

        serde_urlencoded::to_string(&params).map_err(|e| AuthError::Network {
            message: format!("Failed to encode form: {e}"),
        })
    }

    async fn request_grant(&self, grant: Grant, body: String) -> Result<TokenGrant, AuthError> {
        debug!(grant = grant.as_str(), url = %self.token_url, "requesting token");

        let response = self
            .http_client
            .post(self.token_url.clone())
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| AuthError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| AuthError::Network {
            message: format!("Failed to read token response: {e}"),
        })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<TokenErrorResponse>(&bytes).map_or_else(
                |_| {
                    let text = String::from_utf8_lossy(&bytes);
                    if text.trim().is_empty() {
                        format!("Token request failed with status {status}")
                    } else {
                        text.into_owned()
                    }
                },
                TokenErrorResponse::into_message,
            );
            return Err(grant.rejected(message));
        }

        serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedResponse {
            message: format!("Failed to parse token response: {e}"),
        })
    }
}

#[async_trait]
impl TokenExchange for OAuth2TokenEndpoint {
    async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenGrant, AuthError> {
        let body = self.form(
            Grant::Password,
            &[("username", username), ("password", password)],
        )?;
        self.request_grant(Grant::Password, body).await
    }

    async fn refresh_grant(&self, refresh_token: &RefreshToken) -> Result<TokenGrant, AuthError> {
        let body = self.form(
            Grant::Refresh,
            &[("refresh_token", refresh_token.as_str())],
        )?;
        self.request_grant(Grant::Refresh, body).await
    }
}
