//! Request specification type

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AUTHORIZATION, Header, Headers, HttpMethod, RequestBody};
use crate::auth::AccessToken;
use crate::error::{DomainError, DomainResult};

/// Everything needed to issue (and re-issue) one HTTP call.
///
/// `path` is either relative to the API base URL (`/api/managed_users`)
/// or an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Identifier used to correlate log lines of a request and its retry
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Target path or URL
    pub path: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
}

impl RequestSpec {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            headers: Headers::new(),
            body: RequestBody::none(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn post_json<T: Serialize + ?Sized>(path: impl Into<String>, body: &T) -> DomainResult<Self> {
        Ok(Self {
            body: RequestBody::json(body)?,
            ..Self::new(HttpMethod::Post, path)
        })
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(Header::new(name, value));
        self
    }

    /// Returns a copy carrying `Authorization: Bearer <token>`, or no
    /// `Authorization` header at all when `token` is `None`.
    #[must_use]
    pub fn authorized(&self, token: Option<&AccessToken>) -> Self {
        let mut request = self.clone();
        match token {
            Some(token) => request
                .headers
                .set(AUTHORIZATION, token.authorization_header()),
            None => request.headers.remove(AUTHORIZATION),
        }
        request
    }

    /// Returns the `Authorization` header value, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION)
    }

    /// Checks that the path is usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPath` for an empty path.
    pub fn validate(&self) -> DomainResult<()> {
        if self.path.trim().is_empty() {
            return Err(DomainError::InvalidPath("path is empty".to_string()));
        }
        Ok(())
    }
}
