//! Instagram-specific errors.

use postgrab_fetch::{BrowserError, FetchError, HttpError};
use thiserror::Error;

/// Instagram-specific errors.
#[derive(Debug, Error)]
pub enum InstagramError {
    /// HTTP request failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Browser automation failed.
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// Static fetch gave up after the retry budget.
    #[error("profile fetch failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Last failure.
        last_error: HttpError,
    },

    /// The response body was empty.
    #[error("empty document")]
    EmptyDocument,

    /// The response body was not markup (login wall JSON, plain text).
    #[error("document is not markup (starts with {0:?})")]
    NotMarkup(String),

    /// Neither embedded state nor markup yielded a post.
    #[error("no post found in document")]
    NoPostInDocument,

    /// No post link selector matched on the profile page.
    #[error("no post links found on profile page")]
    NoPostLinks,

    /// The post page never rendered a known container.
    #[error("post content did not render")]
    ContainerNotRendered,

    /// No usable image on the post page.
    #[error("no post image found")]
    NoImage,

    /// API returned no media.
    #[error("API returned no media")]
    EmptyFeed,

    /// API item without any image URL.
    #[error("media item {0} has no image URL")]
    MissingMedia(String),

    /// Credential rejected.
    #[error("credential rejected ({0})")]
    Unauthorized(u16),

    /// Rate limited by the API.
    #[error("rate limited")]
    RateLimited {
        /// Seconds to wait.
        retry_after: Option<u64>,
    },

    /// No credential configured.
    #[error("no API credential configured")]
    MissingCredential,

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for InstagramError {
    fn from(err: reqwest::Error) -> Self {
        InstagramError::Http(HttpError::Request(err))
    }
}

impl From<InstagramError> for FetchError {
    fn from(err: InstagramError) -> Self {
        match err {
            InstagramError::Http(e) => FetchError::Http(e),
            InstagramError::Browser(e) => FetchError::Browser(e),
            InstagramError::RetriesExhausted {
                attempts,
                last_error,
            } => FetchError::RetriesExhausted {
                attempts,
                last_error: last_error.to_string(),
            },
            InstagramError::Unauthorized(status) => {
                FetchError::AuthenticationFailed(format!("credential rejected ({status})"))
            }
            InstagramError::RateLimited { retry_after } => FetchError::RateLimited { retry_after },
            InstagramError::MissingCredential => {
                FetchError::StrategyNotAvailable("no API credential configured".to_string())
            }
            InstagramError::Json(e) => FetchError::Json(e),
            other @ (InstagramError::EmptyDocument | InstagramError::NotMarkup(_)) => {
                FetchError::InvalidResponse(other.to_string())
            }
            other => FetchError::Extraction(other.to_string()),
        }
    }
}
