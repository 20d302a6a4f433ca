//! Fetch pipeline for executing strategies in order.
//!
//! The pipeline takes a list of fetch strategies and executes them in
//! priority order, one at a time, until one succeeds. Failures are logged
//! and recorded but never stop the cascade; only exhaustion is reported.

use postgrab_core::{RetrievalOutcome, TargetConfig};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::strategy::{FetchKind, FetchResult, FetchStrategy, StrategyInfo};

// ============================================================================
// Fetch Attempt
// ============================================================================

/// What happened to a strategy during one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The strategy produced a post.
    Succeeded,
    /// The strategy ran and failed.
    Failed,
    /// The strategy was not available and did not run.
    Skipped,
}

/// Record of a single fetch attempt.
#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    /// The strategy ID that was attempted.
    pub strategy_id: String,
    /// The kind of fetch used.
    pub kind: FetchKind,
    /// What happened.
    pub status: AttemptStatus,
    /// Error text if the attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// How long the attempt took.
    pub duration: Duration,
}

impl FetchAttempt {
    /// Creates a successful attempt record.
    pub fn success(strategy_id: impl Into<String>, kind: FetchKind, duration: Duration) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            kind,
            status: AttemptStatus::Succeeded,
            error: None,
            duration,
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(
        strategy_id: impl Into<String>,
        kind: FetchKind,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            kind,
            status: AttemptStatus::Failed,
            error: Some(error.into()),
            duration,
        }
    }

    /// Creates a skipped attempt record.
    pub fn skipped(strategy_id: impl Into<String>, kind: FetchKind) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            kind,
            status: AttemptStatus::Skipped,
            error: None,
            duration: Duration::ZERO,
        }
    }
}

// ============================================================================
// Fetch Outcome
// ============================================================================

/// The outcome of a fetch pipeline execution.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The result (success or final error).
    pub result: Result<FetchResult, FetchError>,
    /// All attempts made, skipped strategies included.
    pub attempts: Vec<FetchAttempt>,
    /// Total duration of all attempts.
    pub duration: Duration,
}

impl FetchOutcome {
    /// Returns true if the fetch succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the number of strategies that actually ran.
    pub fn attempts_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.status != AttemptStatus::Skipped)
            .count()
    }

    /// Returns the successful strategy ID, if any.
    pub fn successful_strategy(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|r| r.strategy_id.as_str())
    }

    /// Returns all errors that occurred.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_deref())
            .collect()
    }

    /// Folds the outcome into the shared result type.
    pub fn into_retrieval_outcome(self) -> RetrievalOutcome {
        self.result.map(|r| r.post).into()
    }
}

// ============================================================================
// Fetch Pipeline
// ============================================================================

/// A pipeline of fetch strategies tried in order.
///
/// The pipeline executes strategies in priority order until one succeeds.
/// Strategies never run in parallel.
pub struct FetchPipeline {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl FetchPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Creates a pipeline with the given strategies.
    pub fn with_strategies(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        let mut pipeline = Self { strategies };
        pipeline.sort_by_priority();
        pipeline
    }

    /// Adds a strategy to the pipeline.
    pub fn add_strategy(&mut self, strategy: Box<dyn FetchStrategy>) {
        self.strategies.push(strategy);
        self.sort_by_priority();
    }

    /// Sorts strategies by priority (highest first). Stable for equal priorities.
    fn sort_by_priority(&mut self) {
        self.strategies.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Returns the number of strategies in the pipeline.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Returns the strategy ids in execution order.
    pub fn strategy_ids(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    /// Returns information about all strategies.
    pub async fn strategy_info(&self, ctx: &FetchContext, target: &TargetConfig) -> Vec<StrategyInfo> {
        let mut info = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            info.push(StrategyInfo::from_strategy(strategy.as_ref(), ctx, target).await);
        }
        info
    }

    /// Execute the pipeline, trying strategies in order until one succeeds.
    ///
    /// The whole run shares one budget, `ctx.settings.timeout`. A strategy
    /// still running when it expires is dropped and recorded as failed, and
    /// no later strategy starts.
    #[instrument(skip(self, ctx, target), fields(profile = %target.identifier(), strategies = self.strategies.len()))]
    pub async fn execute(&self, ctx: &FetchContext, target: &TargetConfig) -> FetchOutcome {
        let start = Instant::now();
        let budget = ctx.settings.timeout;
        let deadline = start.checked_add(budget);
        let mut attempts = Vec::new();

        if self.strategies.is_empty() {
            warn!("No strategies configured");
        } else {
            info!(count = self.strategies.len(), budget = ?budget, "Executing fetch pipeline");
        }

        for strategy in &self.strategies {
            let strategy_id = strategy.id();
            let kind = strategy.kind();

            if !strategy.is_available(ctx, target).await {
                debug!(strategy = %strategy_id, kind = %kind, "Strategy not available, skipping");
                attempts.push(FetchAttempt::skipped(strategy_id, kind));
                continue;
            }

            let attempt_start = Instant::now();
            let remaining =
                deadline.map_or(Duration::MAX, |d| d.saturating_duration_since(attempt_start));
            if remaining.is_zero() {
                warn!(strategy = %strategy_id, "Retrieval budget spent before strategy could run");
                attempts.push(FetchAttempt::failure(
                    strategy_id,
                    kind,
                    FetchError::Timeout(budget).to_string(),
                    Duration::ZERO,
                ));
                break;
            }

            debug!(strategy = %strategy_id, remaining = ?remaining, "Executing strategy");

            let error = match tokio::time::timeout(remaining, strategy.fetch(ctx, target)).await {
                Ok(Ok(result)) => {
                    let duration = attempt_start.elapsed();
                    info!(
                        strategy = %strategy_id,
                        duration = ?duration,
                        "Strategy succeeded"
                    );

                    attempts.push(FetchAttempt::success(strategy_id, kind, duration));

                    return FetchOutcome {
                        result: Ok(result),
                        attempts,
                        duration: start.elapsed(),
                    };
                }
                Ok(Err(error)) => error,
                Err(_) => FetchError::Timeout(budget),
            };

            let duration = attempt_start.elapsed();
            warn!(
                strategy = %strategy_id,
                error = %error,
                class = ?error.class(),
                duration = ?duration,
                "Strategy failed"
            );

            let out_of_time = matches!(error, FetchError::Timeout(_));
            attempts.push(FetchAttempt::failure(
                strategy_id,
                kind,
                error.to_string(),
                duration,
            ));
            if out_of_time {
                break;
            }
        }

        warn!("All strategies failed");
        FetchOutcome {
            result: Err(FetchError::AllStrategiesFailed(summarize(&attempts))),
            attempts,
            duration: start.elapsed(),
        }
    }
}

impl Default for FetchPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins the failure reasons of every strategy that ran.
fn summarize(attempts: &[FetchAttempt]) -> String {
    let failures: Vec<String> = attempts
        .iter()
        .filter(|a| a.status == AttemptStatus::Failed)
        .map(|a| format!("{}: {}", a.strategy_id, a.error.as_deref().unwrap_or("unknown")))
        .collect();

    if failures.is_empty() {
        "no strategy was available".to_string()
    } else {
        failures.join("; ")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use postgrab_core::{Caption, PostRecord};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockStrategy {
        id: String,
        kind: FetchKind,
        available: bool,
        succeed: bool,
        calls: Arc<AtomicU32>,
    }

    impl MockStrategy {
        fn new(id: &str, kind: FetchKind, succeed: bool) -> Self {
            Self {
                id: id.to_string(),
                kind,
                available: true,
                succeed,
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }
    }

    #[async_trait]
    impl FetchStrategy for MockStrategy {
        fn id(&self) -> &str {
            &self.id
        }

        fn kind(&self) -> FetchKind {
            self.kind
        }

        async fn is_available(&self, _ctx: &FetchContext, _target: &TargetConfig) -> bool {
            self.available
        }

        async fn fetch(
            &self,
            _ctx: &FetchContext,
            _target: &TargetConfig,
        ) -> Result<FetchResult, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                let post = PostRecord::new(Caption::Missing, format!("https://cdn/{}.jpg", self.id));
                Ok(FetchResult::new(post, self.id.clone(), self.kind))
            } else {
                Err(FetchError::Extraction(format!("{} broke", self.id)))
            }
        }
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = FetchPipeline::new();
        let ctx = FetchContext::new();
        let outcome = pipeline.execute(&ctx, &TargetConfig::default()).await;

        assert!(!outcome.is_success());
        assert!(outcome.attempts.is_empty());
        let err = outcome.result.unwrap_err();
        assert!(matches!(err, FetchError::AllStrategiesFailed(_)));
        assert_eq!(
            err.to_string(),
            "all retrieval methods exhausted (no strategy was available)"
        );
    }

    #[tokio::test]
    async fn test_priority_order_regardless_of_insertion() {
        let pipeline = FetchPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("api", FetchKind::OfficialApi, true)),
            Box::new(MockStrategy::new("static", FetchKind::StaticHtml, true)),
            Box::new(MockStrategy::new("browser", FetchKind::Browser, true)),
        ]);

        assert_eq!(pipeline.strategy_ids(), vec!["browser", "static", "api"]);
    }

    #[tokio::test]
    async fn test_fallback_on_failure() {
        let pipeline = FetchPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("browser", FetchKind::Browser, false)),
            Box::new(MockStrategy::new("static", FetchKind::StaticHtml, true)),
        ]);

        let ctx = FetchContext::new();
        let outcome = pipeline.execute(&ctx, &TargetConfig::default()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts_count(), 2);
        assert_eq!(outcome.successful_strategy(), Some("static"));
        assert_eq!(outcome.errors(), vec!["Extraction failed: browser broke"]);
    }

    #[tokio::test]
    async fn test_skipped_not_counted_as_failure() {
        let pipeline = FetchPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("browser", FetchKind::Browser, false)),
            Box::new(MockStrategy::new("api", FetchKind::OfficialApi, true).unavailable()),
        ]);

        let ctx = FetchContext::new();
        let outcome = pipeline.execute(&ctx, &TargetConfig::default()).await;

        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.attempts[1].status, AttemptStatus::Skipped);
        assert_eq!(outcome.attempts_count(), 1);

        let reason = outcome.into_retrieval_outcome().reason().map(str::to_string);
        let reason = reason.unwrap();
        assert!(reason.starts_with("all retrieval methods exhausted"));
        assert!(reason.contains("browser: Extraction failed: browser broke"));
        assert!(!reason.contains("api"));
    }

    struct SlowStrategy {
        id: &'static str,
        kind: FetchKind,
        delay: Duration,
    }

    #[async_trait]
    impl FetchStrategy for SlowStrategy {
        fn id(&self) -> &str {
            self.id
        }

        fn kind(&self) -> FetchKind {
            self.kind
        }

        async fn is_available(&self, _ctx: &FetchContext, _target: &TargetConfig) -> bool {
            true
        }

        async fn fetch(
            &self,
            _ctx: &FetchContext,
            _target: &TargetConfig,
        ) -> Result<FetchResult, FetchError> {
            tokio::time::sleep(self.delay).await;
            let post = PostRecord::new(Caption::Missing, "https://cdn/slow.jpg");
            Ok(FetchResult::new(post, self.id, self.kind))
        }
    }

    #[tokio::test]
    async fn test_budget_cuts_slow_strategy() {
        let fallback = MockStrategy::new("static", FetchKind::StaticHtml, true);
        let fallback_calls = fallback.calls.clone();
        let pipeline = FetchPipeline::with_strategies(vec![
            Box::new(SlowStrategy {
                id: "browser",
                kind: FetchKind::Browser,
                delay: Duration::from_secs(5),
            }),
            Box::new(fallback),
        ]);

        let ctx = FetchContext::builder()
            .timeout(Duration::from_millis(100))
            .build();
        let started = Instant::now();
        let outcome = pipeline.execute(&ctx, &TargetConfig::default()).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].status, AttemptStatus::Failed);

        let reason = outcome.into_retrieval_outcome().reason().map(str::to_string).unwrap();
        assert!(reason.starts_with("all retrieval methods exhausted"));
        assert!(reason.contains("browser: Retrieval timed out after 100ms"));
    }

    #[tokio::test]
    async fn test_fast_strategy_within_budget() {
        let pipeline = FetchPipeline::with_strategies(vec![Box::new(SlowStrategy {
            id: "static",
            kind: FetchKind::StaticHtml,
            delay: Duration::from_millis(10),
        })]);

        let ctx = FetchContext::builder()
            .timeout(Duration::from_secs(5))
            .build();
        let outcome = pipeline.execute(&ctx, &TargetConfig::default()).await;
        assert_eq!(outcome.successful_strategy(), Some("static"));
    }

    #[tokio::test]
    async fn test_all_skipped() {
        let pipeline = FetchPipeline::with_strategies(vec![Box::new(
            MockStrategy::new("api", FetchKind::OfficialApi, true).unavailable(),
        )]);

        let ctx = FetchContext::new();
        let outcome = pipeline.execute(&ctx, &TargetConfig::default()).await;
        let err = outcome.result.unwrap_err();
        assert!(err.to_string().contains("no strategy was available"));
    }
}
