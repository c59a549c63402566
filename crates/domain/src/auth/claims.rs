//! Role claim decoding.
//!
//! Access tokens are signed JWTs. The middle segment is a base64url JSON
//! payload carrying the user's role. Signatures are not verified here: the
//! server is the authority, the decoded role only drives advisory gating.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use super::types::{AccessToken, AuthError, Role};

/// Claims read from an access token payload. Other claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Authorization role.
    pub role: Role,
}

fn invalid(message: impl Into<String>) -> AuthError {
    AuthError::InvalidToken {
        message: message.into(),
    }
}

/// Decodes the claims from an access token.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if the token is not three dot-separated
/// segments, the payload is not base64url JSON, or the role claim is
/// missing or empty.
pub fn decode_claims(token: &AccessToken) -> Result<TokenClaims, AuthError> {
    let mut segments = token.as_str().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(invalid("expected three dot-separated segments"));
    };

    // Some issuers keep the padding even though JWTs should not carry it.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| invalid(format!("payload is not base64url: {e}")))?;

    let claims: TokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| invalid(format!("payload is not a claims object: {e}")))?;

    if claims.role.as_str().is_empty() {
        return Err(invalid("role claim is empty"));
    }

    Ok(claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Builds an unsigned JWT-shaped token around the given JSON payload.
    pub(crate) fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_role_claim() {
        let token = AccessToken::new(token_with_payload(
            r#"{"role":"admin","exp":1700000000,"email":"a@x.com"}"#,
        ));

        assert_eq!(
            decode_claims(&token).unwrap(),
            TokenClaims {
                role: Role::admin()
            }
        );
    }

    #[test]
    fn test_decode_accepts_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(r#"{"role":"user"}"#);
        let token = AccessToken::new(format!("{header}.{body}.sig"));

        assert_eq!(decode_claims(&token).unwrap().role, Role::new("user"));
    }

    #[test]
    fn test_decode_rejects_opaque_token() {
        let err = decode_claims(&AccessToken::new("A1")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode_claims(&AccessToken::new("a.!!!.c")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn test_decode_rejects_missing_or_empty_role() {
        let missing = AccessToken::new(token_with_payload(r#"{"sub":"42"}"#));
        assert!(decode_claims(&missing).is_err());

        let empty = AccessToken::new(token_with_payload(r#"{"role":""}"#));
        assert!(decode_claims(&empty).is_err());
    }
}
