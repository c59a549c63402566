//! HTTP request body types

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// The kind of request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestBodyKind {
    /// No body
    #[default]
    None,
    /// JSON document
    Json,
}

/// HTTP request body with its encoded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestBody {
    /// The kind of body
    pub kind: RequestBodyKind,
    /// The encoded body content
    #[serde(default)]
    pub content: String,
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: RequestBodyKind::None,
            content: String::new(),
        }
    }

    /// Encodes a value as a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBody` if the value cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> DomainResult<Self> {
        let content =
            serde_json::to_string(value).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        Ok(Self {
            kind: RequestBodyKind::Json,
            content,
        })
    }

    /// Returns whether the body is empty or none.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // String::is_empty is not const
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, RequestBodyKind::None) || self.content.is_empty()
    }

    /// Returns the content type if applicable.
    #[must_use]
    pub const fn content_type(&self) -> Option<&'static str> {
        match self.kind {
            RequestBodyKind::None => None,
            RequestBodyKind::Json => Some("application/json"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_body() {
        let body = RequestBody::json(&serde_json::json!({"managed_user": {"email": "b@x.com"}}))
            .unwrap();
        assert_eq!(body.content_type(), Some("application/json"));
        assert_eq!(body.content, r#"{"managed_user":{"email":"b@x.com"}}"#);
        assert!(!body.is_empty());
    }

    #[test]
    fn test_none_body() {
        let body = RequestBody::none();
        assert!(body.is_empty());
        assert_eq!(body.content_type(), None);
    }
}
