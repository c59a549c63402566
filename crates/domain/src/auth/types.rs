//! Credential and session types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::claims::decode_claims;

/// Role name that grants access to user management.
const ADMIN_ROLE: &str = "admin";

/// Number of characters shown by token previews.
const PREVIEW_LEN: usize = 8;

fn preview(token: &str) -> String {
    if token.chars().count() > PREVIEW_LEN + 4 {
        let head: String = token.chars().take(PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        token.to_string()
    }
}

/// Opaque bearer credential attached to resource requests.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Returns a short preview safe to log (first 8 chars + ...).
    #[must_use]
    pub fn preview(&self) -> String {
        preview(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&self.preview()).finish()
    }
}

/// Credential exchanged for a new access token. Rotated on every refresh.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wraps a raw refresh token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short preview safe to log.
    #[must_use]
    pub fn preview(&self) -> String {
        preview(&self.0)
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&self.preview()).finish()
    }
}

/// Authorization role claim carried by the access token.
///
/// Client-side checks against the role are advisory: they decide what a
/// front end renders, while the server remains the authority on access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Creates a role from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The administrator role.
    #[must_use]
    pub fn admin() -> Self {
        Self(ADMIN_ROLE.to_string())
    }

    /// Returns the role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_ROLE
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Successful response from the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// The newly issued access token.
    pub access_token: AccessToken,
    /// The rotated refresh token.
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    /// Token type, normally "Bearer".
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenGrant {
    /// Creates a bearer grant carrying both tokens.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken::new(access_token),
            refresh_token: Some(RefreshToken::new(refresh_token)),
            token_type: default_token_type(),
            expires_in: None,
        }
    }
}

/// The authenticated session: both credentials plus the decoded role.
///
/// Persisted as the three string fields `access_token`, `refresh_token`
/// and `role`, which are always written and removed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Current access token.
    pub access_token: AccessToken,
    /// Current refresh token.
    pub refresh_token: RefreshToken,
    /// Role claim decoded from the access token.
    pub role: Role,
}

impl Session {
    /// Creates a session from its parts.
    #[must_use]
    pub const fn new(access_token: AccessToken, refresh_token: RefreshToken, role: Role) -> Self {
        Self {
            access_token,
            refresh_token,
            role,
        }
    }

    /// Builds a session from a token endpoint grant.
    ///
    /// The role is decoded from the access token's payload.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the access token cannot be decoded,
    /// or `AuthError::MalformedResponse` if the grant carries no refresh token.
    pub fn from_grant(grant: TokenGrant) -> Result<Self, AuthError> {
        let claims = decode_claims(&grant.access_token)?;
        let refresh_token = grant
            .refresh_token
            .ok_or_else(|| AuthError::MalformedResponse {
                message: "token response is missing refresh_token".to_string(),
            })?;
        Ok(Self::new(grant.access_token, refresh_token, claims.role))
    }
}

/// Authentication errors. Every variant is terminal for the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token endpoint rejected the login credentials.
    #[error("credentials rejected: {message}")]
    Rejected {
        /// Server-provided reason.
        message: String,
    },

    /// The access token is not a decodable signed token with a role claim.
    #[error("invalid access token: {message}")]
    InvalidToken {
        /// What failed to decode.
        message: String,
    },

    /// A refresh was needed but no refresh token is held.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The token endpoint rejected the refresh token.
    #[error("refresh token rejected: {message}")]
    RefreshRejected {
        /// Server-provided reason.
        message: String,
    },

    /// The refresh exchange did not complete in time.
    #[error("token refresh timed out after {timeout_ms} ms")]
    RefreshTimedOut {
        /// The configured timeout.
        timeout_ms: u64,
    },

    /// The refresh cycle ended without producing a result.
    #[error("token refresh was abandoned before completing")]
    RefreshAbandoned,

    /// The token endpoint could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },

    /// The token endpoint answered with something that is not a token grant.
    #[error("malformed token response: {message}")]
    MalformedResponse {
        /// Parse error description.
        message: String,
    },
}
