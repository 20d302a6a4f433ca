// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `postgrab` Core
//!
//! Core types shared by every `postgrab` crate.
//!
//! ## Key Types
//!
//! - [`TargetConfig`] - The profile to retrieve from, plus an optional credential
//! - [`PostRecord`] - The normalized latest post
//! - [`Caption`] - Caption text with an explicit missing/unavailable state
//! - [`RetrievalOutcome`] - Success with a post, or failure with a reason
//! - [`RetrievalSource`] - Which strategy produced a post

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Target
    normalize_identifier,
    validate_identifier,
    TargetConfig,
    DEFAULT_IDENTIFIER,
    // Post
    format_timestamp,
    normalize_timestamp,
    unix_to_iso8601,
    Caption,
    CaptionStatus,
    PostRecord,
    RetrievalSource,
    CAPTION_UNAVAILABLE,
    NO_CAPTION,
    // Outcome
    RetrievalOutcome,
};
