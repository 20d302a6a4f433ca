//! JSON output formatting.

use anyhow::Result;
use postgrab_core::PostRecord;
use postgrab_fetch::{AttemptStatus, FetchAttempt, FetchKind, FetchOutcome};
use serde::Serialize;
use std::time::Duration;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one retrieval run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeOutput<'a> {
    pub profile: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<&'a PostRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: Vec<AttemptOutput<'a>>,
    pub duration_ms: u64,
}

/// A single attempt in the ledger.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutput<'a> {
    pub strategy: &'a str,
    pub kind: FetchKind,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    pub duration_ms: u64,
}

impl<'a> From<&'a FetchAttempt> for AttemptOutput<'a> {
    fn from(attempt: &'a FetchAttempt) -> Self {
        Self {
            strategy: &attempt.strategy_id,
            kind: attempt.kind,
            status: attempt.status,
            error: attempt.error.as_deref(),
            duration_ms: millis(attempt.duration),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a retrieval outcome with its attempt ledger.
    pub fn format_outcome(&self, outcome: &FetchOutcome, profile: &str) -> Result<String> {
        self.format(&Self::outcome_to_output(outcome, profile))
    }

    /// Converts an outcome to its output shape.
    pub(crate) fn outcome_to_output<'a>(
        outcome: &'a FetchOutcome,
        profile: &'a str,
    ) -> OutcomeOutput<'a> {
        let attempts = outcome.attempts.iter().map(AttemptOutput::from).collect();
        let duration_ms = millis(outcome.duration);

        match &outcome.result {
            Ok(result) => OutcomeOutput {
                profile,
                status: "success",
                strategy: Some(&result.strategy_id),
                post: Some(&result.post),
                error: None,
                attempts,
                duration_ms,
            },
            Err(e) => OutcomeOutput {
                profile,
                status: "failure",
                strategy: None,
                post: None,
                error: Some(e.to_string()),
                attempts,
                duration_ms,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_attempt_output() {
        let attempt = FetchAttempt::failure(
            "instagram.static",
            FetchKind::StaticHtml,
            "Request timed out",
            Duration::from_millis(1500),
        );
        let output = AttemptOutput::from(&attempt);
        assert_eq!(output.strategy, "instagram.static");
        assert_eq!(output.duration_ms, 1500);
        assert_eq!(output.error, Some("Request timed out"));
    }
}
