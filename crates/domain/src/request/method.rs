//! Methods used against the resource API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Request method. `GET` when unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Reads, e.g. listing managed users.
    #[default]
    Get,
    /// Creates.
    Post,
    /// Full replacement.
    Put,
    /// Partial update.
    Patch,
    /// Removal.
    Delete,
}

impl HttpMethod {
    /// True for methods whose requests carry a JSON body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Wire name, e.g. `"PATCH"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    /// Case-insensitive; anything outside the five supported methods is rejected.
    fn from_str(s: &str) -> DomainResult<Self> {
        const ALL: [HttpMethod; 5] = [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
        ];
        ALL.into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnsupportedMethod(s.to_string()))
    }
}
