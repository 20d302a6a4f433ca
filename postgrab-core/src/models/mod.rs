//! Domain models for postgrab.
//!
//! ## Submodules
//!
//! - [`target`] - What to retrieve (TargetConfig, identifier normalisation)
//! - [`post`] - What comes back (PostRecord, Caption, RetrievalSource)
//! - [`outcome`] - The success/failure contract (RetrievalOutcome)

pub mod outcome;
pub mod post;
pub mod target;

// Re-export everything at the models level
pub use outcome::RetrievalOutcome;
pub use post::{
    format_timestamp, normalize_timestamp, unix_to_iso8601, Caption, CaptionStatus, PostRecord,
    RetrievalSource, CAPTION_UNAVAILABLE, NO_CAPTION,
};
pub use target::{normalize_identifier, validate_identifier, TargetConfig, DEFAULT_IDENTIFIER};
