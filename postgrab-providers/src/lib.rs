// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # postgrab Providers
//!
//! The Instagram content source and the latest-post orchestrator.
//!
//! The source module includes:
//!
//! - **Descriptor**: Static configuration and the pipeline builder
//! - **Strategies**: Browser, static document, and Graph API retrieval
//! - **Parser**: Embedded-state and markup extraction
//! - **Selectors**: Ordered selector tables for the rendered pages
//!
//! ## Strategies
//!
//! | Strategy | Kind | Needs |
//! |----------|------|-------|
//! | `instagram.browser` | Browser | Chromium on the host |
//! | `instagram.static` | Static HTML | nothing |
//! | `instagram.api` | Official API | a bearer credential |
//!
//! ## Usage
//!
//! ```ignore
//! use postgrab_core::TargetConfig;
//! use postgrab_fetch::FetchContext;
//! use postgrab_providers::PostRetriever;
//!
//! let retriever = PostRetriever::new(FetchContext::new(), TargetConfig::new("nasa"));
//! let outcome = retriever.get_latest_post().await;
//! ```

pub mod descriptor;
pub mod instagram;
pub mod retriever;

// Re-export key types
pub use descriptor::{FetchPlan, SourceDescriptor};
pub use retriever::{PostRetriever, TargetHandle};

// Re-export the Instagram source
pub use instagram::{
    InstagramApiStrategy, InstagramBrowserStrategy, InstagramError, InstagramStaticStrategy,
    build_instagram_pipeline, instagram_descriptor,
};
