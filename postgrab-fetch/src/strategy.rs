//! Fetch strategy trait and types.
//!
//! A strategy represents one self-contained method of acquiring the latest
//! post (headless browser, static document, official API). Each strategy owns
//! its internal retry and fallback logic; the pipeline only sees success or
//! failure.

use async_trait::async_trait;
use postgrab_core::{PostRecord, RetrievalOutcome, RetrievalSource, TargetConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Fetch Kind
// ============================================================================

/// The kind of acquisition mechanism a strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// Rendered in a headless browser.
    Browser,
    /// Raw profile document over HTTP.
    StaticHtml,
    /// Documented REST endpoint with a bearer credential.
    OfficialApi,
}

impl FetchKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Browser => "Browser",
            Self::StaticHtml => "Static HTML",
            Self::OfficialApi => "Official API",
        }
    }

    /// Converts to the source recorded on a post.
    pub fn to_retrieval_source(&self) -> RetrievalSource {
        match self {
            Self::Browser => RetrievalSource::Browser,
            Self::StaticHtml => RetrievalSource::StaticHtml,
            Self::OfficialApi => RetrievalSource::OfficialApi,
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Fetch Result
// ============================================================================

/// The result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The retrieved post.
    pub post: PostRecord,
    /// The strategy that succeeded.
    pub strategy_id: String,
    /// The kind of fetch used.
    pub kind: FetchKind,
}

impl FetchResult {
    /// Creates a new fetch result, stamping the post with its source.
    pub fn new(post: PostRecord, strategy_id: impl Into<String>, kind: FetchKind) -> Self {
        Self {
            post: post.with_source(kind.to_retrieval_source()),
            strategy_id: strategy_id.into(),
            kind,
        }
    }
}

// ============================================================================
// Fetch Strategy Trait
// ============================================================================

/// A method of retrieving the latest post for a target.
///
/// Strategies receive a read-only snapshot of the target. They never panic
/// or propagate past their boundary: every failure comes back as a
/// [`FetchError`], and [`FetchStrategy::run`] folds it into a
/// [`RetrievalOutcome`].
///
/// ## Implementing a Strategy
///
/// ```ignore
/// struct FeedStrategy;
///
/// #[async_trait]
/// impl FetchStrategy for FeedStrategy {
///     fn id(&self) -> &str {
///         "instagram.feed"
///     }
///
///     fn kind(&self) -> FetchKind {
///         FetchKind::StaticHtml
///     }
///
///     async fn is_available(&self, _ctx: &FetchContext, _target: &TargetConfig) -> bool {
///         true
///     }
///
///     async fn fetch(
///         &self,
///         ctx: &FetchContext,
///         target: &TargetConfig,
///     ) -> Result<FetchResult, FetchError> {
///         let post = scrape(ctx, target.identifier()).await?;
///         Ok(FetchResult::new(post, self.id(), self.kind()))
///     }
/// }
/// ```
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Unique identifier for this strategy (e.g., "instagram.browser").
    fn id(&self) -> &str;

    /// The kind of fetch this strategy uses.
    fn kind(&self) -> FetchKind;

    /// Human-readable name for this strategy.
    fn display_name(&self) -> String {
        format!("{} ({})", self.id(), self.kind().display_name())
    }

    /// Check if this strategy can run for `target`.
    ///
    /// Local checks only. An unavailable strategy is skipped, not failed.
    async fn is_available(&self, ctx: &FetchContext, target: &TargetConfig) -> bool;

    /// Retrieve the latest post.
    async fn fetch(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<FetchResult, FetchError>;

    /// Runs the strategy and reports through the shared outcome type.
    async fn run(&self, ctx: &FetchContext, target: &TargetConfig) -> RetrievalOutcome {
        self.fetch(ctx, target).await.map(|r| r.post).into()
    }

    /// Priority of this strategy (higher = try first).
    ///
    /// Default priorities:
    /// - Browser: 100
    /// - Static HTML: 60
    /// - Official API: 20
    fn priority(&self) -> u32 {
        match self.kind() {
            FetchKind::Browser => 100,
            FetchKind::StaticHtml => 60,
            FetchKind::OfficialApi => 20,
        }
    }
}

// ============================================================================
// Strategy Info
// ============================================================================

/// Information about a strategy (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Strategy ID.
    pub id: String,
    /// Strategy kind.
    pub kind: FetchKind,
    /// Whether the strategy is available.
    pub available: bool,
    /// Priority.
    pub priority: u32,
}

impl StrategyInfo {
    /// Creates strategy info from a strategy implementation.
    pub async fn from_strategy(
        strategy: &dyn FetchStrategy,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Self {
        Self {
            id: strategy.id().to_string(),
            kind: strategy.kind(),
            available: strategy.is_available(ctx, target).await,
            priority: strategy.priority(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use postgrab_core::Caption;

    struct Failing;

    #[async_trait]
    impl FetchStrategy for Failing {
        fn id(&self) -> &str {
            "test.failing"
        }

        fn kind(&self) -> FetchKind {
            FetchKind::StaticHtml
        }

        async fn is_available(&self, _ctx: &FetchContext, _target: &TargetConfig) -> bool {
            true
        }

        async fn fetch(
            &self,
            _ctx: &FetchContext,
            _target: &TargetConfig,
        ) -> Result<FetchResult, FetchError> {
            Err(FetchError::Extraction("no media edges".into()))
        }
    }

    #[test]
    fn test_fetch_kind_display() {
        assert_eq!(FetchKind::Browser.display_name(), "Browser");
        assert_eq!(FetchKind::StaticHtml.to_string(), "Static HTML");
    }

    #[test]
    fn test_fetch_result_stamps_source() {
        let post = PostRecord::new(Caption::Missing, "https://cdn/img.jpg");
        let result = FetchResult::new(post, "instagram.api", FetchKind::OfficialApi);
        assert_eq!(result.post.source, RetrievalSource::OfficialApi);
    }

    #[test]
    fn test_priority_order() {
        assert!(Failing.priority() < 100);
        assert!(Failing.priority() > 20);
    }

    #[tokio::test]
    async fn test_run_preserves_reason_text() {
        let ctx = FetchContext::new();
        let outcome = Failing.run(&ctx, &TargetConfig::default()).await;
        assert_eq!(
            outcome.reason(),
            Some("Extraction failed: no media edges")
        );
    }
}
