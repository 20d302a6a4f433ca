// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # postgrab Fetch
//!
//! Retrieval infrastructure for postgrab.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//! - [`host::browser`] - Headless browser sessions (Chromium)
//!
//! ## Fetch Pipeline
//!
//! The fetch pipeline executes strategies in priority order:
//!
//! - [`strategy::FetchStrategy`] - Trait for retrieval methods
//! - [`pipeline::FetchPipeline`] - Executes strategies in order
//! - [`context::FetchContext`] - Provides access to host APIs
//!
//! ## Building Blocks
//!
//! - [`retry::RetryStrategy`] - Exponential backoff with jitter
//! - [`cascade::first_match`] - First-match-wins search over candidates
//! - [`fingerprint::random_identity`] - Randomized client identity
//! - [`artifacts::DiagnosticSink`] - Optional debug artifact output
//!
//! ## Example
//!
//! ```ignore
//! use postgrab_core::TargetConfig;
//! use postgrab_fetch::{FetchContext, FetchPipeline};
//!
//! let ctx = FetchContext::new();
//! let pipeline = FetchPipeline::with_strategies(vec![
//!     Box::new(BrowserStrategy::new()),
//!     Box::new(StaticStrategy::new()),
//! ]);
//!
//! let outcome = pipeline.execute(&ctx, &TargetConfig::new("nasa")).await;
//! ```

pub mod artifacts;
pub mod cascade;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod host;
pub mod pipeline;
pub mod retry;
pub mod strategy;

// Errors
pub use error::{BrowserError, ErrorClass, FetchError, HttpError};

// Host APIs
pub use host::{
    browser::{
        BrowserLauncher, BrowserSession, ChromiumLauncher, DomElement, ReadyState, SessionProfile,
        Viewport,
    },
    http::{HttpClient, ResponseExt},
};

// Strategy & Pipeline
pub use context::{FetchContext, FetchContextBuilder, FetchSettings, SourceMode};
pub use pipeline::{AttemptStatus, FetchAttempt, FetchOutcome, FetchPipeline};
pub use strategy::{FetchKind, FetchResult, FetchStrategy, StrategyInfo};

// Building blocks
pub use artifacts::{ArtifactKind, DiagnosticSink, DirectorySink, NoopSink};
pub use cascade::{CascadeHit, first_match, first_match_async};
pub use fingerprint::{ClientIdentity, random_identity};
pub use retry::{RetryDecision, RetryOutcome, RetryStrategy};
