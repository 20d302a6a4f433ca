//! CLI command implementations.

pub mod config;
pub mod latest;
pub mod strategies;

use anyhow::Result;
use postgrab_fetch::FetchContext;
use postgrab_providers::PostRetriever;
use postgrab_store::Config;

/// Builds a retriever from the stored configuration.
pub(crate) fn retriever_from_config(config: &Config) -> PostRetriever {
    let ctx = FetchContext::with_settings(config.to_fetch_settings());
    PostRetriever::new(ctx, config.to_target())
}

/// Loads the configuration from its default location.
pub(crate) async fn load_config() -> Result<Config> {
    Ok(Config::load().await?)
}
