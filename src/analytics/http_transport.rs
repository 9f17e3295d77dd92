//! Analytics HTTP Transport
//!
//! This module implements the [`Transport`] trait over HTTPS using
//! `reqwest`. Every call is a single authenticated GET:
//!
//! ```text
//! GET {base_url}{path}
//! Authorization: Bearer {session_token}
//! ```
//!
//! Cursor URLs returned by the listing endpoint are usually host-relative
//! paths and get the base URL prepended. A cursor that is already an
//! absolute `http(s)://` URL is only followed when its scheme, host and
//! port match the base URL; the bearer token never leaves that origin.
//!
//! # Example
//!
//! ```ignore
//! use analytics_quota::analytics::HttpTransport;
//!
//! let transport = HttpTransport::new("https://tenant.example.com", token)?;
//! let body = transport.get("/services/data/v58.0/wave/datasets").await?;
//! ```

use crate::analytics::transport::Transport;
use crate::config::PlatformConfig;
use crate::error::{QuotaError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response body excerpt carried in an error message
const ERROR_BODY_EXCERPT: usize = 200;

/// HTTP transport for the analytics REST API
///
/// Holds the base endpoint and bearer token explicitly; nothing is read
/// from process state.
pub struct HttpTransport {
    /// Reqwest HTTP client
    client: reqwest::Client,

    /// Base URL with trailing slashes removed
    base_url: String,

    /// Session token sent as a bearer credential
    session_token: String,

    /// Request timeout
    timeout: Duration,
}

impl HttpTransport {
    /// Create a new transport for `base_url` authenticated with `session_token`
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            base_url,
            session_token: session_token.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Create a transport from the `[platform]` configuration section
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Transport`] if the base URL or token is missing,
    /// or the HTTP client cannot be built.
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| QuotaError::Transport("No base URL configured".to_string()))?;
        let token = config
            .session_token
            .as_deref()
            .ok_or_else(|| QuotaError::Transport("No session token configured".to_string()))?;

        Self::new(base_url, token)?.with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Set the request timeout
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Transport`] if the HTTP client cannot be rebuilt.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a path or cursor into the absolute URL to request
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Transport`] if `path` is an absolute URL on a
    /// different origin than the base URL, or cannot be parsed.
    pub fn resolve(&self, path: &str) -> Result<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let base = Url::parse(&self.base_url).map_err(|e| {
                QuotaError::Transport(format!("Invalid base URL {}: {}", self.base_url, e))
            })?;
            let target = Url::parse(path)
                .map_err(|e| QuotaError::Transport(format!("Invalid cursor URL {}: {}", path, e)))?;

            if target.origin() != base.origin() {
                return Err(QuotaError::Transport(format!(
                    "Refusing to follow cursor to {}: origin differs from {}",
                    target.origin().ascii_serialization(),
                    base.origin().ascii_serialization()
                )));
            }
            return Ok(path.to_string());
        }

        if path.starts_with('/') {
            Ok(format!("{}{}", self.base_url, path))
        } else {
            Ok(format!("{}/{}", self.base_url, path))
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QuotaError::Transport(format!("Failed to build HTTP client: {}", e)))
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_EXCERPT {
        body.to_string()
    } else {
        let cut: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
        format!("{}...", cut)
    }
}

#[allow(async_fn_in_trait)]
impl Transport for HttpTransport {
    /// Send an authenticated GET and return the response body
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Transport`] if:
    /// - An absolute cursor points at another origin
    /// - The request cannot be sent or times out
    /// - The server answers with a non-success status
    /// - The body cannot be read
    async fn get(&self, path: &str) -> Result<String> {
        let url = self.resolve(path)?;

        tracing::debug!("Sending HTTP GET to {}", url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.session_token))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| QuotaError::Transport(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuotaError::Transport(format!(
                "GET {} failed with status {}: {}",
                url,
                status,
                excerpt(&body)
            )));
        }

        let body = response.text().await.map_err(|e| {
            QuotaError::Transport(format!("Failed to read response body from {}: {}", url, e))
        })?;

        tracing::debug!("Received {} bytes from {}", body.len(), url);

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new("https://example.com/", "token").unwrap();
        assert_eq!(transport.base_url(), "https://example.com");
        assert_eq!(transport.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_http_transport_with_timeout() {
        let transport = HttpTransport::new("https://example.com", "token")
            .unwrap()
            .with_timeout(Duration::from_secs(60))
            .unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_resolve_relative_and_same_origin() {
        let transport = HttpTransport::new("https://example.com//", "token").unwrap();
        assert_eq!(
            transport
                .resolve("/services/data/v58.0/wave/datasets")
                .unwrap(),
            "https://example.com/services/data/v58.0/wave/datasets"
        );
        assert_eq!(transport.resolve("a/b").unwrap(), "https://example.com/a/b");
        assert_eq!(
            transport.resolve("https://example.com/page?2").unwrap(),
            "https://example.com/page?2"
        );
        assert_eq!(
            transport.resolve("https://example.com:443/page?2").unwrap(),
            "https://example.com:443/page?2"
        );
    }

    #[test]
    fn test_resolve_rejects_other_origin() {
        let transport = HttpTransport::new("https://example.com", "token").unwrap();
        for cursor in [
            "https://other.example.com/page?2",
            "http://example.com/page?2",
            "https://example.com:8443/page?2",
            "https://example.com.attacker.test/page?2",
        ] {
            let err = transport.resolve(cursor).unwrap_err();
            assert!(err.is_transport(), "{}", cursor);
            assert!(err.to_string().contains("Refusing to follow cursor"));
        }
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = PlatformConfig::default();
        let err = HttpTransport::from_config(&config).err().unwrap();
        assert!(err.is_transport());
        assert!(err.to_string().contains("base URL"));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let body = "x".repeat(500);
        let cut = excerpt(&body);
        assert_eq!(cut.len(), ERROR_BODY_EXCERPT + 3);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_transport_trait_bounds() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpTransport>();
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v58.0/wave/datasets"))
            .and(header("Authorization", "Bearer secret-session"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"datasets":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "secret-session").unwrap();
        let body = transport
            .get("/services/data/v58.0/wave/datasets")
            .await
            .unwrap();

        assert_eq!(body, r#"{"datasets":[]}"#);
    }

    #[tokio::test]
    async fn test_get_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("INVALID_SESSION_ID"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "expired").unwrap();
        let err = transport.get("/anything").await.unwrap_err();

        assert!(err.is_transport());
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("INVALID_SESSION_ID"));
    }

    #[tokio::test]
    async fn test_get_other_origin_sends_nothing() {
        let tenant = MockServer::start().await;
        let other = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&other)
            .await;

        let transport = HttpTransport::new(tenant.uri(), "secret-session").unwrap();
        let err = transport
            .get(&format!("{}/collect", other.uri()))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(other.received_requests().await.unwrap().is_empty());
        assert!(tenant.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_unreachable_host_is_transport_error() {
        // Port 9 (discard) is not expected to serve HTTP
        let transport = HttpTransport::new("http://127.0.0.1:9", "token")
            .unwrap()
            .with_timeout(Duration::from_secs(2))
            .unwrap();
        let err = transport.get("/x").await.unwrap_err();
        assert!(err.is_transport());
    }
}
