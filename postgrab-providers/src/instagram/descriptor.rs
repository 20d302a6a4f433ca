//! Instagram source descriptor.

use postgrab_fetch::{FetchContext, FetchPipeline, FetchStrategy, SourceMode};

use super::strategies::{InstagramApiStrategy, InstagramBrowserStrategy, InstagramStaticStrategy};
use crate::descriptor::{FetchPlan, SourceDescriptor};

/// Returns the Instagram descriptor.
pub fn instagram_descriptor() -> SourceDescriptor {
    SourceDescriptor {
        id: "instagram",
        display_name: "Instagram",
        website: "https://www.instagram.com",
        fetch_plan: FetchPlan {
            source_modes: vec![SourceMode::Browser, SourceMode::Static, SourceMode::Api],
            build_pipeline: build_instagram_pipeline,
        },
    }
}

/// Builds the browser → static → API pipeline, filtered by source mode.
pub fn build_instagram_pipeline(ctx: &FetchContext) -> FetchPipeline {
    let mode = ctx.settings.source_mode;
    let mut strategies: Vec<Box<dyn FetchStrategy>> = Vec::new();

    if mode.allows_browser() {
        strategies.push(Box::new(InstagramBrowserStrategy::new()));
    }
    if mode.allows_static() {
        strategies.push(Box::new(InstagramStaticStrategy::new()));
    }
    if mode.allows_api() {
        strategies.push(Box::new(InstagramApiStrategy::new()));
    }

    FetchPipeline::with_strategies(strategies)
}
