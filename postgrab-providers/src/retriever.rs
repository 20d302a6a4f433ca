//! Latest-post orchestrator.
//!
//! [`PostRetriever`] owns the fetch context, the strategy pipeline, and the
//! current target. Each call reads a snapshot of the target when it starts,
//! so reconfiguration only affects later calls.

use postgrab_core::{RetrievalOutcome, TargetConfig};
use postgrab_fetch::{FetchContext, FetchOutcome, FetchPipeline, StrategyInfo};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::instagram::build_instagram_pipeline;

// ============================================================================
// Target Handle
// ============================================================================

/// Shared, last-writer-wins handle to the current target.
///
/// Cloning the handle shares the same target.
#[derive(Debug, Clone)]
pub struct TargetHandle {
    tx: Arc<watch::Sender<TargetConfig>>,
}

impl TargetHandle {
    /// Creates a handle holding `target`.
    pub fn new(target: TargetConfig) -> Self {
        let (tx, _rx) = watch::channel(target);
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the identifier. Blank input falls back to the default.
    pub fn set(&self, identifier: impl AsRef<str>) {
        let identifier = identifier.as_ref();
        self.tx.send_modify(|target| target.set_identifier(identifier));
        info!(profile = %self.tx.borrow().identifier(), "Target updated");
    }

    /// Replaces the credential.
    pub fn set_credential(&self, credential: Option<String>) {
        self.tx.send_modify(|target| {
            *target = target.clone().with_credential(credential);
        });
    }

    /// Returns a copy of the current target.
    pub fn snapshot(&self) -> TargetConfig {
        self.tx.borrow().clone()
    }

    /// Returns a receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<TargetConfig> {
        self.tx.subscribe()
    }
}

// ============================================================================
// Post Retriever
// ============================================================================

/// Runs the strategy pipeline against the current target.
pub struct PostRetriever {
    ctx: FetchContext,
    pipeline: FetchPipeline,
    target: TargetHandle,
}

impl PostRetriever {
    /// Creates a retriever with the Instagram pipeline for `ctx`'s source mode.
    pub fn new(ctx: FetchContext, target: TargetConfig) -> Self {
        let pipeline = build_instagram_pipeline(&ctx);
        Self::with_pipeline(ctx, pipeline, target)
    }

    /// Creates a retriever with a custom pipeline.
    pub fn with_pipeline(ctx: FetchContext, pipeline: FetchPipeline, target: TargetConfig) -> Self {
        Self {
            ctx,
            pipeline,
            target: TargetHandle::new(target),
        }
    }

    /// Changes the target for subsequent calls.
    pub fn set_target(&self, identifier: impl AsRef<str>) {
        self.target.set(identifier);
    }

    /// Returns the current target.
    pub fn target(&self) -> TargetConfig {
        self.target.snapshot()
    }

    /// Returns a handle that can retarget this retriever from elsewhere.
    pub fn target_handle(&self) -> TargetHandle {
        self.target.clone()
    }

    /// Returns the fetch context.
    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    /// Returns the latest post, or a failure naming every strategy's error.
    pub async fn get_latest_post(&self) -> RetrievalOutcome {
        self.get_latest_post_detailed()
            .await
            .into_retrieval_outcome()
    }

    /// Like [`Self::get_latest_post`], keeping the per-strategy attempt ledger.
    #[instrument(skip(self))]
    pub async fn get_latest_post_detailed(&self) -> FetchOutcome {
        let target = self.target.snapshot();
        self.pipeline.execute(&self.ctx, &target).await
    }

    /// Reports each strategy's availability for the current target.
    pub async fn strategy_info(&self) -> Vec<StrategyInfo> {
        let target = self.target.snapshot();
        self.pipeline.strategy_info(&self.ctx, &target).await
    }
}

impl std::fmt::Debug for PostRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostRetriever")
            .field("target", &self.target.snapshot())
            .field("strategies", &self.pipeline.strategy_ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_last_writer_wins() {
        let handle = TargetHandle::new(TargetConfig::new("first"));
        let other = handle.clone();

        handle.set("second");
        other.set("@third");
        assert_eq!(handle.snapshot().identifier(), "third");

        handle.set("   ");
        assert_eq!(other.snapshot().identifier(), "instagram");
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let handle = TargetHandle::new(TargetConfig::new("first"));
        let mut rx = handle.subscribe();

        handle.set("second");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().identifier(), "second");
    }

    #[test]
    fn test_set_credential_keeps_identifier() {
        let handle = TargetHandle::new(TargetConfig::new("nasa"));
        handle.set_credential(Some("token".into()));
        let target = handle.snapshot();
        assert_eq!(target.identifier(), "nasa");
        assert!(target.has_credential());
    }

    #[test]
    fn test_new_uses_source_mode() {
        let retriever = PostRetriever::new(FetchContext::new(), TargetConfig::new("nasa"));
        assert_eq!(
            retriever.pipeline.strategy_ids(),
            vec!["instagram.browser", "instagram.static", "instagram.api"]
        );
        retriever.set_target("esa");
        assert_eq!(retriever.target().identifier(), "esa");
    }
}
