//! Retrieval outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::post::PostRecord;

/// Result of a retrieval: exactly one of a post or a failure reason.
///
/// Every strategy and the orchestrator report through this type. The failure
/// reason is carried verbatim so it can be aggregated as diagnostic context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    /// A usable post was retrieved.
    Success(PostRecord),
    /// Retrieval failed with the given reason.
    Failure(String),
}

impl RetrievalOutcome {
    /// Creates a failure outcome.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    /// Returns true if a post was retrieved.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if retrieval failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the post, if any.
    pub fn post(&self) -> Option<&PostRecord> {
        match self {
            Self::Success(post) => Some(post),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(reason) => Some(reason),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<PostRecord, String> {
        match self {
            Self::Success(post) => Ok(post),
            Self::Failure(reason) => Err(reason),
        }
    }
}

impl<E: fmt::Display> From<Result<PostRecord, E>> for RetrievalOutcome {
    fn from(result: Result<PostRecord, E>) -> Self {
        match result {
            Ok(post) => Self::Success(post),
            Err(e) => Self::Failure(e.to_string()),
        }
    }
}

impl fmt::Display for RetrievalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(post) => write!(f, "success: {}", post.image_url),
            Self::Failure(reason) => write!(f, "failure: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Caption;

    #[test]
    fn test_from_result_keeps_reason_text() {
        let result: Result<PostRecord, String> = Err("selector cascade exhausted".to_string());
        let outcome = RetrievalOutcome::from(result);
        assert_eq!(outcome.reason(), Some("selector cascade exhausted"));
        assert!(outcome.post().is_none());
    }

    #[test]
    fn test_exactly_one_variant() {
        let ok = RetrievalOutcome::Success(PostRecord::new(Caption::Missing, "img"));
        assert!(ok.is_success() && !ok.is_failure());
        assert!(ok.reason().is_none());

        let err = RetrievalOutcome::failure("nope");
        assert!(err.is_failure() && !err.is_success());
        assert_eq!(err.into_result().unwrap_err(), "nope");
    }
}
