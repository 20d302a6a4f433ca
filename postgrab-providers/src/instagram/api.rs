//! Official Graph API client.

use postgrab_core::{Caption, PostRecord, TargetConfig, normalize_timestamp};
use postgrab_fetch::{FetchContext, HttpError, ResponseExt};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::error::InstagramError;

// ============================================================================
// Constants
// ============================================================================

/// Media listing endpoint for the credential's own account.
const MEDIA_ENDPOINT: &str = "/me/media";

/// Fields requested for each media item.
const MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp,like_count";

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the media listing endpoint.
#[derive(Debug, Deserialize)]
pub struct MediaListResponse {
    /// Media items, newest first.
    #[serde(default)]
    pub data: Vec<MediaItem>,
}

/// One media item.
#[derive(Debug, Deserialize)]
pub struct MediaItem {
    /// Media ID.
    pub id: String,

    /// Caption text.
    #[serde(default)]
    pub caption: Option<String>,

    /// IMAGE, VIDEO or `CAROUSEL_ALBUM`.
    #[serde(default)]
    pub media_type: Option<String>,

    /// Media URL. For videos this is the video file.
    #[serde(default)]
    pub media_url: Option<String>,

    /// Thumbnail, present for videos.
    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Public permalink.
    #[serde(default)]
    pub permalink: Option<String>,

    /// Publication time, `+0000` offset style.
    #[serde(default)]
    pub timestamp: Option<String>,

    /// Like count, when the token may read it.
    #[serde(default)]
    pub like_count: Option<u64>,
}

impl MediaItem {
    fn is_video(&self) -> bool {
        self.media_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("VIDEO"))
    }

    /// Picks the displayable image: thumbnail for videos, media URL otherwise.
    pub fn image_url(&self) -> Option<&str> {
        let (primary, fallback) = if self.is_video() {
            (&self.thumbnail_url, &self.media_url)
        } else {
            (&self.media_url, &self.thumbnail_url)
        };
        primary
            .as_deref()
            .or(fallback.as_deref())
            .filter(|u| !u.is_empty())
    }

    /// Converts to a post record.
    pub fn into_post(self) -> Result<PostRecord, InstagramError> {
        let image_url = self
            .image_url()
            .map(str::to_string)
            .ok_or_else(|| InstagramError::MissingMedia(self.id.clone()))?;

        Ok(PostRecord::new(Caption::from_text(self.caption), image_url)
            .with_id(Some(self.id))
            .with_timestamp(self.timestamp.as_deref().map(normalize_timestamp))
            .with_like_count(self.like_count)
            .with_post_url(self.permalink))
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Graph API client.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphApiClient;

impl GraphApiClient {
    /// Creates a new client.
    pub fn new() -> Self {
        Self
    }

    fn media_url(base: &str) -> String {
        format!(
            "{}{MEDIA_ENDPOINT}?fields={MEDIA_FIELDS}&limit=1",
            base.trim_end_matches('/')
        )
    }

    /// Fetches the newest media item for the configured credential.
    #[instrument(skip(self, ctx, target))]
    pub async fn fetch_latest(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<PostRecord, InstagramError> {
        let token = target.credential().ok_or(InstagramError::MissingCredential)?;
        let url = Self::media_url(&ctx.settings.api_base_url);

        let response = ctx
            .http
            .get_with_bearer(&url, token, Some(ctx.settings.request_timeout))
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(InstagramError::Unauthorized(status.as_u16()));
        }
        if response.is_rate_limited() {
            return Err(InstagramError::RateLimited {
                retry_after: response.retry_after_secs(),
            });
        }
        if !status.is_success() {
            return Err(InstagramError::Http(HttpError::Status {
                status: status.as_u16(),
                retry_after: None,
            }));
        }

        let body = response.text().await?;
        let listing: MediaListResponse = serde_json::from_str(&body)?;
        debug!(items = listing.data.len(), "Media listing received");

        listing
            .data
            .into_iter()
            .next()
            .ok_or(InstagramError::EmptyFeed)?
            .into_post()
    }
}
