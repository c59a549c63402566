//! Client configuration.
//!
//! Values come from an optional `rolegate.{toml,yaml,json}` file and
//! `ROLEGATE_*` environment variables, which take precedence. Every field
//! has a default, so an empty environment yields a client for a local
//! development server.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use reqwest::Url;
use rolegate_application::ports::{HttpClientError, SessionStorageError};
use rolegate_application::{ClientSettings, RolegateClient};
use serde::{Deserialize, Serialize};

use crate::adapters::ReqwestHttpClient;
use crate::auth::{ClientCredentials, OAuth2TokenEndpoint};
use crate::persistence::FileSessionRepository;

/// Prefix of the environment variables read by [`ClientConfig::load`].
pub const ENV_PREFIX: &str = "ROLEGATE";

/// Errors while loading configuration or wiring the client from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A configured URL is invalid.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending value.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] HttpClientError),

    /// No session file location is available.
    #[error("session storage error: {0}")]
    Storage(#[from] SessionStorageError),
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// API base URL; resource paths are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the token endpoint, relative to `base_url`.
    #[serde(default = "default_token_path")]
    pub token_path: String,

    /// OAuth2 client identifier.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// OAuth2 client secret; empty for public clients.
    #[serde(default)]
    pub client_secret: String,

    /// Upper bound on one refresh exchange, in seconds.
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Session file; defaults to the user's config directory.
    #[serde(default)]
    pub session_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_token_path() -> String {
    "/oauth/token".to_string()
}

fn default_client_id() -> String {
    "TestClient".to_string()
}

const fn default_refresh_timeout_secs() -> u64 {
    10
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_path: default_token_path(),
            client_id: default_client_id(),
            client_secret: String::new(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            session_file: None,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `file` (or `./rolegate.*` if present) and
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing or any
    /// source holds a value of the wrong type.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("rolegate").required(false),
        };

        Ok(Config::builder()
            .add_source(file_source)
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?)
    }

    /// The token endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` or `token_path` is invalid.
    pub fn token_url(&self) -> Result<Url, ConfigError> {
        if let Ok(absolute) = Url::parse(&self.token_path) {
            return Ok(absolute);
        }
        let invalid = |e: url::ParseError| ConfigError::InvalidUrl {
            url: format!("{}{}", self.base_url, self.token_path),
            message: e.to_string(),
        };
        Url::parse(&self.base_url)
            .and_then(|base| base.join(&self.token_path))
            .map_err(invalid)
    }

    /// Refresh exchange timeout.
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Client credentials for the token endpoint.
    #[must_use]
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    /// File session storage at the configured or default location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Storage` if no location is configured and the
    /// platform has no config directory.
    pub fn session_storage(&self) -> Result<FileSessionRepository, ConfigError> {
        match &self.session_file {
            Some(path) => Ok(FileSessionRepository::new(path.clone())),
            None => Ok(FileSessionRepository::in_config_dir()?),
        }
    }

    /// Wires a [`RolegateClient`] with the reqwest transport, the token
    /// endpoint and file session storage.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid or no session location exists.
    pub fn build_client(&self) -> Result<RolegateClient, ConfigError> {
        let http = ReqwestHttpClient::with_timeout(&self.base_url, self.request_timeout())?;
        let exchange = OAuth2TokenEndpoint::new(self.token_url()?, self.credentials());
        let storage = self.session_storage()?;

        Ok(RolegateClient::new(
            Arc::new(http),
            Arc::new(exchange),
            Arc::new(storage),
            ClientSettings {
                refresh_timeout: self.refresh_timeout(),
            },
        ))
    }
}
