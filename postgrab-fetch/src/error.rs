//! Fetch error types.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Class
// ============================================================================

/// How an error affects the retrieval flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Timeouts, resets, throttling. Retried inside a strategy only.
    Transient,
    /// Extraction failed or the document has the wrong shape. Never retried.
    Structural,
    /// Missing credential or similar. The strategy is skipped.
    Configuration,
    /// A local resource (the browser) could not be acquired.
    Resource,
}

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The overall retrieval budget ran out.
    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    /// Rate limited by the source.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from the source.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Extraction found nothing usable.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] postgrab_core::CoreError),

    /// Browser error.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Retry budget used up on transient failures.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Display text of the last failure.
        last_error: String,
    },

    /// Strategy not available.
    #[error("Strategy not available: {0}")]
    StrategyNotAvailable(String),

    /// All strategies failed.
    #[error("all retrieval methods exhausted ({0})")]
    AllStrategiesFailed(String),
}

impl FetchError {
    /// Classifies this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Http(e) => e.class(),
            Self::Timeout(_) | Self::RateLimited { .. } | Self::RetriesExhausted { .. } => {
                ErrorClass::Transient
            }
            Self::AuthenticationFailed(_) | Self::StrategyNotAvailable(_) => {
                ErrorClass::Configuration
            }
            Self::Browser(e) => e.class(),
            Self::InvalidResponse(_)
            | Self::Extraction(_)
            | Self::Json(_)
            | Self::Core(_)
            | Self::AllStrategiesFailed(_) => ErrorClass::Structural,
        }
    }

    /// Returns true if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header value.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Non-success status code.
    #[error("Unexpected status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Value of `Retry-After`, in seconds.
        retry_after: Option<u64>,
    },

    /// Timeout.
    #[error("Request timed out")]
    Timeout,
}

impl HttpError {
    /// Classifies this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Request(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                ErrorClass::Transient
            }
            Self::Request(e) if e.is_body() || e.is_decode() => ErrorClass::Transient,
            Self::Timeout => ErrorClass::Transient,
            Self::Status { status, .. } if *status == 429 || *status >= 500 => {
                ErrorClass::Transient
            }
            Self::DomainNotAllowed(_) | Self::InvalidUrl(_) | Self::InvalidHeader { .. } => {
                ErrorClass::Configuration
            }
            _ => ErrorClass::Structural,
        }
    }

    /// Returns true if the request should be retried.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Returns the server-requested wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

// ============================================================================
// Browser Error
// ============================================================================

/// Error type for headless browser operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No Chromium binary found.
    #[error("Browser executable not found: {0}")]
    ExecutableNotFound(String),

    /// Browser process failed to start.
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Navigation failed.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation {
        /// Target URL.
        url: String,
        /// Failure detail.
        reason: String,
    },

    /// Navigation did not reach the readiness condition in time.
    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout {
        /// Target URL.
        url: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// DevTools protocol or script evaluation error.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The session was already closed.
    #[error("Browser session closed")]
    Closed,
}

impl BrowserError {
    /// Classifies this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ExecutableNotFound(_) | Self::LaunchFailed(_) | Self::Closed => {
                ErrorClass::Resource
            }
            Self::Navigation { .. } | Self::NavigationTimeout { .. } => ErrorClass::Transient,
            Self::Protocol(_) => ErrorClass::Structural,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Protocol(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let throttled = HttpError::Status {
            status: 429,
            retry_after: Some(3),
        };
        assert!(throttled.is_transient());
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(3)));

        let unavailable = HttpError::Status {
            status: 503,
            retry_after: None,
        };
        assert!(unavailable.is_transient());

        let missing = HttpError::Status {
            status: 404,
            retry_after: None,
        };
        assert_eq!(missing.class(), ErrorClass::Structural);
    }

    #[test]
    fn test_fetch_error_classes() {
        assert_eq!(
            FetchError::Extraction("no post links".into()).class(),
            ErrorClass::Structural
        );
        assert_eq!(
            FetchError::StrategyNotAvailable("no credential".into()).class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            FetchError::Browser(BrowserError::LaunchFailed("boom".into())).class(),
            ErrorClass::Resource
        );
        assert!(FetchError::Timeout(Duration::from_secs(10)).is_transient());
        assert_eq!(
            FetchError::Timeout(Duration::from_millis(200)).to_string(),
            "Retrieval timed out after 200ms"
        );
    }

    #[test]
    fn test_exhausted_message() {
        let err = FetchError::AllStrategiesFailed("browser: x; static: y".into());
        assert!(err.to_string().starts_with("all retrieval methods exhausted"));
    }
}
