//! Source descriptor system.
//!
//! A descriptor contains the static configuration for a content source:
//! - Metadata (id, display name, website)
//! - Fetch plan (which source modes exist and how to build the pipeline)

use postgrab_fetch::{FetchContext, FetchPipeline, SourceMode};

// ============================================================================
// Source Descriptor
// ============================================================================

/// Complete descriptor for a content source.
pub struct SourceDescriptor {
    /// Source identifier.
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Public website.
    pub website: &'static str,
    /// How to retrieve posts.
    pub fetch_plan: FetchPlan,
}

impl SourceDescriptor {
    /// Builds the fetch pipeline for this source.
    pub fn build_pipeline(&self, ctx: &FetchContext) -> FetchPipeline {
        (self.fetch_plan.build_pipeline)(ctx)
    }

    /// Returns true if `mode` selects at least one strategy of this source.
    pub fn supports(&self, mode: SourceMode) -> bool {
        mode == SourceMode::Auto || self.fetch_plan.source_modes.contains(&mode)
    }
}

impl std::fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("id", &self.id)
            .field("source_modes", &self.fetch_plan.source_modes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Plan
// ============================================================================

/// Configuration for how to fetch posts.
pub struct FetchPlan {
    /// Supported source modes in priority order.
    pub source_modes: Vec<SourceMode>,
    /// Function to build the fetch pipeline.
    pub build_pipeline: fn(&FetchContext) -> FetchPipeline,
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self {
            source_modes: vec![SourceMode::Auto],
            build_pipeline: |_| FetchPipeline::new(),
        }
    }
}
