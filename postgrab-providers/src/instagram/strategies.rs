//! Instagram fetch strategies.

use async_trait::async_trait;
use postgrab_core::TargetConfig;
use postgrab_fetch::{FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy};
use tracing::{debug, instrument};

use super::api::GraphApiClient;
use super::browser::InstagramBrowserScraper;
use super::web::InstagramWebClient;

// ============================================================================
// Browser Strategy
// ============================================================================

/// Renders the profile in a headless browser and scrapes the latest post.
#[derive(Debug, Default)]
pub struct InstagramBrowserStrategy {
    scraper: InstagramBrowserScraper,
}

impl InstagramBrowserStrategy {
    /// Creates a new browser strategy.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FetchStrategy for InstagramBrowserStrategy {
    fn id(&self) -> &str {
        "instagram.browser"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::Browser
    }

    /// Always runs. A missing binary surfaces as a launch failure in the ledger.
    async fn is_available(&self, _ctx: &FetchContext, _target: &TargetConfig) -> bool {
        true
    }

    #[instrument(skip(self, ctx, target))]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<FetchResult, FetchError> {
        debug!("Fetching latest post via headless browser");
        let post = self.scraper.fetch_latest(ctx, target).await?;
        Ok(FetchResult::new(post, self.id(), self.kind()))
    }
}

// ============================================================================
// Static Strategy
// ============================================================================

/// Downloads the profile page and parses embedded state or markup.
#[derive(Debug, Default)]
pub struct InstagramStaticStrategy {
    client: InstagramWebClient,
}

impl InstagramStaticStrategy {
    /// Creates a new static strategy.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FetchStrategy for InstagramStaticStrategy {
    fn id(&self) -> &str {
        "instagram.static"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::StaticHtml
    }

    async fn is_available(&self, _ctx: &FetchContext, _target: &TargetConfig) -> bool {
        true
    }

    #[instrument(skip(self, ctx, target))]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<FetchResult, FetchError> {
        debug!("Fetching latest post via static page");
        let post = self.client.fetch_latest(ctx, target).await?;
        Ok(FetchResult::new(post, self.id(), self.kind()))
    }
}

// ============================================================================
// API Strategy
// ============================================================================

/// Reads the newest media item from the official Graph API.
///
/// Only available when the target carries a credential.
#[derive(Debug, Default)]
pub struct InstagramApiStrategy {
    client: GraphApiClient,
}

impl InstagramApiStrategy {
    /// Creates a new API strategy.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FetchStrategy for InstagramApiStrategy {
    fn id(&self) -> &str {
        "instagram.api"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::OfficialApi
    }

    async fn is_available(&self, _ctx: &FetchContext, target: &TargetConfig) -> bool {
        target.has_credential()
    }

    #[instrument(skip(self, ctx, target))]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<FetchResult, FetchError> {
        debug!("Fetching latest post via Graph API");
        let post = self.client.fetch_latest(ctx, target).await?;
        Ok(FetchResult::new(post, self.id(), self.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_and_priorities() {
        let browser = InstagramBrowserStrategy::new();
        let stat = InstagramStaticStrategy::new();
        let api = InstagramApiStrategy::new();

        assert_eq!(browser.id(), "instagram.browser");
        assert!(browser.priority() > stat.priority());
        assert!(stat.priority() > api.priority());
    }

    #[tokio::test]
    async fn test_browser_always_attempted() {
        let ctx = FetchContext::new();
        let browser = InstagramBrowserStrategy::new();
        assert!(browser.is_available(&ctx, &TargetConfig::new("nasa")).await);
    }

    #[tokio::test]
    async fn test_api_requires_credential() {
        let ctx = FetchContext::new();
        let api = InstagramApiStrategy::new();

        assert!(!api.is_available(&ctx, &TargetConfig::new("nasa")).await);
        let with_token = TargetConfig::new("nasa").with_credential(Some("tok".into()));
        assert!(api.is_available(&ctx, &with_token).await);
    }
}
