//! Token endpoint port

use async_trait::async_trait;
use rolegate_domain::{AuthError, RefreshToken, TokenGrant};

/// Port for the OAuth2 token endpoint.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchanges user credentials for tokens (`grant_type=password`).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` with the server's reason when the
    /// credentials are refused, `AuthError::Network` when the endpoint is
    /// unreachable.
    async fn password_grant(&self, username: &str, password: &str)
    -> Result<TokenGrant, AuthError>;

    /// Exchanges a refresh token for rotated tokens (`grant_type=refresh_token`).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RefreshRejected` when the refresh token is invalid
    /// or expired, `AuthError::Network` when the endpoint is unreachable.
    async fn refresh_grant(&self, refresh_token: &RefreshToken) -> Result<TokenGrant, AuthError>;
}
