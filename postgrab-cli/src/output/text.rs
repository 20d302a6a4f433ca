//! Text output formatting with colors.

use chrono::{DateTime, Local, Utc};
use postgrab_core::PostRecord;
use postgrab_fetch::{AttemptStatus, FetchAttempt, StrategyInfo};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats a retrieved post.
    pub fn format_post(&self, post: &PostRecord, profile: &str) -> String {
        self.format_post_at(post, profile, Utc::now())
    }

    /// Formats a retrieved post relative to `now`.
    pub fn format_post_at(&self, post: &PostRecord, profile: &str, now: DateTime<Utc>) -> String {
        let mut lines = Vec::new();

        // Header: "@nasa (Browser)"
        lines.push(format!(
            "{} ({})",
            self.bold(&format!("@{profile}")),
            post.source.display_name()
        ));
        lines.push("─".repeat(40));

        let caption = if post.caption.is_present() {
            post.caption.as_str().to_string()
        } else {
            self.dim(post.caption.as_str())
        };
        lines.push(caption);
        lines.push(String::new());

        lines.push(format!("Image:  {}", self.cyan(&post.image_url)));
        if let Some(url) = &post.post_url {
            lines.push(format!("Post:   {url}"));
        }
        if let Some(ts) = &post.timestamp {
            match format_posted_at(ts, now) {
                Some(when) => lines.push(format!("Posted: {} ({})", when, self.dim(ts))),
                None => lines.push(format!("Posted: {ts}")),
            }
        }
        if let Some(likes) = post.like_count {
            lines.push(format!("Likes:  {likes}"));
        }

        lines.join("\n")
    }

    /// Formats a retrieval failure.
    pub fn format_failure(&self, profile: &str, reason: &str) -> String {
        format!(
            "{}: {} - {}",
            self.bold(&format!("@{profile}")),
            self.red("No post retrieved"),
            reason
        )
    }

    /// Formats the attempt ledger.
    pub fn format_attempts(&self, attempts: &[FetchAttempt]) -> String {
        let mut lines = vec![self.dim("Attempts:")];

        for attempt in attempts {
            let mark = match attempt.status {
                AttemptStatus::Succeeded => self.green("✓"),
                AttemptStatus::Failed => self.red("✗"),
                AttemptStatus::Skipped => self.dim("−"),
            };
            let mut line = format!(
                "  {} {:<20} {:>6}ms",
                mark,
                attempt.strategy_id,
                attempt.duration.as_millis()
            );
            if let Some(err) = &attempt.error {
                line.push_str(&format!("  {}", self.dim(err)));
            } else if attempt.status == AttemptStatus::Skipped {
                line.push_str(&format!("  {}", self.dim("not available")));
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    /// Formats the strategy list header.
    pub fn format_strategies_header(&self) -> String {
        format!(
            "{:<20} {:<14} {:<10} {}",
            self.bold("Strategy"),
            self.bold("Kind"),
            self.bold("Priority"),
            self.bold("Available")
        )
    }

    /// Formats a single strategy line.
    pub fn format_strategy_line(&self, info: &StrategyInfo) -> String {
        let available = if info.available {
            self.green("✓")
        } else {
            self.dim("−")
        };

        format!(
            "{:<20} {:<14} {:<10} {}",
            info.id,
            info.kind.display_name(),
            info.priority,
            available
        )
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// Renders an ISO-8601 timestamp as a relative age plus local time.
///
/// Returns `None` when the timestamp does not parse.
pub fn format_posted_at(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let posted = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    let local = posted.with_timezone(&Local);
    Some(format!(
        "{}, {}",
        format_age(now - posted),
        local.format("%Y-%m-%d %H:%M")
    ))
}

/// Formats an elapsed duration as a coarse age.
pub fn format_age(elapsed: chrono::Duration) -> String {
    if elapsed < chrono::Duration::minutes(1) {
        return "just now".to_string();
    }

    let (n, unit) = if elapsed < chrono::Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < chrono::Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else {
        (elapsed.num_days(), "day")
    };

    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}
