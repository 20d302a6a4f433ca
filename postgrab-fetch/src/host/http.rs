//! HTTP client with tracing and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist for security
//! - Per-request timeouts and header sets
//! - Status checking that keeps `Retry-After`

use reqwest::{Client, Response, header, header::HeaderMap};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fallback user agent when a request carries no identity headers.
const USER_AGENT: &str = concat!("postgrab/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom default timeout.
    ///
    /// Falls back to reqwest's default client if the configured one cannot
    /// be built.
    pub fn with_timeout(timeout: Duration) -> Self {
        let inner = Self::build_client(timeout).unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            Client::new()
        });

        Self {
            inner,
            allowed_domains: None,
        }
    }

    /// Restricts requests to the given domains and their subdomains.
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    fn build_client(timeout: Duration) -> Result<Client, HttpError> {
        Ok(Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?)
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.get_with_headers(url, HeaderMap::new(), None).await
    }

    /// Performs a GET request with custom headers and an optional timeout
    /// overriding the client default.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request");

        let mut request = self.inner.get(url).headers(headers);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Request(e)
            }
        })?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request with a bearer token.
    #[instrument(skip(self, token), fields(url = %url))]
    pub async fn get_with_bearer(
        &self,
        url: &str,
        token: &str,
        timeout: Option<Duration>,
    ) -> Result<Response, HttpError> {
        let mut headers = HeaderMap::new();
        let value = header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            HttpError::InvalidHeader {
                name: header::AUTHORIZATION.to_string(),
                reason: e.to_string(),
            }
        })?;
        headers.insert(header::AUTHORIZATION, value);
        self.get_with_headers(url, headers, timeout).await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt: Sized {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;

    /// Turns a non-2xx response into [`HttpError::Status`].
    fn check_status(self) -> Result<Self, HttpError>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    fn check_status(self) -> Result<Self, HttpError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }
        Err(HttpError::Status {
            status: status.as_u16(),
            retry_after: self.retry_after_secs(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::new().with_allowed_domains(vec!["instagram.com".to_string()]);

        assert!(client.is_domain_allowed("https://www.instagram.com/nasa/").is_ok());
        assert!(client.is_domain_allowed("https://graph.instagram.com/me/media").is_ok());
        assert!(client.is_domain_allowed("https://evil.com/steal").is_err());
        assert!(client.is_domain_allowed("https://notinstagram.com/").is_err());
    }

    #[tokio::test]
    async fn test_disallowed_host_never_requested() {
        let client = HttpClient::new().with_allowed_domains(vec!["instagram.com".to_string()]);
        let err = client.get("http://127.0.0.1:9/nasa/").await.unwrap_err();
        assert!(matches!(err, HttpError::DomainNotAllowed(host) if host == "127.0.0.1"));
    }

    #[test]
    fn test_no_domain_restrictions() {
        let client = HttpClient::new();
        assert!(client.is_domain_allowed("https://any.domain.com").is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = HttpClient::new().with_allowed_domains(vec!["example.com".to_string()]);
        assert!(matches!(
            client.is_domain_allowed("not-a-valid-url"),
            Err(HttpError::InvalidUrl(_))
        ));
    }
}
