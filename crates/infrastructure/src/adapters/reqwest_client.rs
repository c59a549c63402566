//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Relative request paths are resolved against the configured API base URL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use rolegate_application::ports::{HttpClient, HttpClientError};
use rolegate_domain::{HttpMethod, RequestBody, RequestBodyKind, RequestSpec, ResponseSpec};
use tracing::trace;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a client for the API at `base_url`.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - Follow redirects: up to 10
    /// - User-Agent: "Rolegate/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be created.
    pub fn new(base_url: &str) -> Result<Self, HttpClientError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be created.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(concat!("Rolegate/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            timeout,
        })
    }

    /// The API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a request path against the base URL. Absolute URLs are used as-is.
    fn resolve(&self, path: &str) -> Result<Url, HttpClientError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }
        self.base_url
            .join(path)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {path}")))
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn build_body(builder: reqwest::RequestBuilder, body: &RequestBody) -> reqwest::RequestBuilder {
        match body.kind {
            RequestBodyKind::None => builder,
            RequestBodyKind::Json => builder.body(body.content.clone()),
        }
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = error.to_string();
            if message.to_lowercase().contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: error
                        .url()
                        .and_then(|u| u.host_str().map(String::from))
                        .unwrap_or_else(|| "unknown".to_string()),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

/// Parses a base URL, making sure it ends with `/` so relative joins keep its path.
fn parse_base_url(base_url: &str) -> Result<Url, HttpClientError> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&normalized).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {base_url}")))
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        let url = self.resolve(request.path.trim_start_matches('/'))?;
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);

        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout);

        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }

        // Add Content-Type if body has one and not already set
        if let Some(content_type) = request.body.content_type()
            && request.headers.get("content-type").is_none()
        {
            builder = builder.header("Content-Type", content_type);
        }

        builder = Self::build_body(builder, &request.body);

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        let duration = start.elapsed();
        trace!(request_id = %request.id, status, ?duration, "http exchange finished");

        Ok(ResponseSpec::new(status, headers, body, duration))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Post),
            Method::POST
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let client = ReqwestHttpClient::new("http://localhost:3000").unwrap();
        let url = client.resolve("api/managed_users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/managed_users");
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = ReqwestHttpClient::new("https://example.com/v1").unwrap();
        let url = client.resolve("api/managed_users").unwrap();
        assert_eq!(url.as_str(), "https://example.com/v1/api/managed_users");
    }

    #[test]
    fn test_absolute_url_used_as_is() {
        let client = ReqwestHttpClient::new("http://localhost:3000").unwrap();
        let url = client.resolve("https://other.example/x").unwrap();
        assert_eq!(url.as_str(), "https://other.example/x");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ReqwestHttpClient::new("not a url");
        assert!(matches!(result, Err(HttpClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_mapped() {
        // Port 9 (discard) is closed on test machines.
        let client = ReqwestHttpClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2))
            .unwrap();

        let err = client
            .execute(&RequestSpec::get("/api/managed_users"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HttpClientError::ConnectionRefused { .. }
                | HttpClientError::ConnectionFailed(_)
                | HttpClientError::Timeout { .. }
        ));
    }
}
