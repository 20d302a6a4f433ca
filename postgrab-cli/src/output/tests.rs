//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::{TextFormatter, format_age, format_posted_at};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use postgrab_core::{Caption, PostRecord, RetrievalSource};
    use postgrab_fetch::{FetchAttempt, FetchKind, StrategyInfo};
    use std::time::Duration as StdDuration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
    }

    fn sample_post() -> PostRecord {
        PostRecord::new(
            Caption::Text("Launch day at the pad".to_string()),
            "https://scontent.cdninstagram.com/v/launch.jpg",
        )
        .with_timestamp(Some("2024-03-01T12:00:00.000Z".to_string()))
        .with_post_url(Some("https://www.instagram.com/p/C1/".to_string()))
        .with_like_count(Some(42))
        .with_source(RetrievalSource::Browser)
    }

    #[test]
    fn test_format_post_fields() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_post_at(&sample_post(), "nasa", now());

        assert!(output.starts_with("@nasa (Browser)"));
        assert!(output.contains("Launch day at the pad"));
        assert!(output.contains("Image:  https://scontent.cdninstagram.com/v/launch.jpg"));
        assert!(output.contains("Post:   https://www.instagram.com/p/C1/"));
        assert!(output.contains("3 hours ago"));
        assert!(output.contains("Likes:  42"));
    }

    #[test]
    fn test_format_post_placeholder_caption() {
        let formatter = TextFormatter::new(false);
        let mut post = sample_post();
        post.caption = Caption::Unavailable;
        post.timestamp = None;
        post.like_count = None;

        let output = formatter.format_post_at(&post, "nasa", now());

        assert!(output.contains("Caption unavailable"));
        assert!(!output.contains("Posted:"));
        assert!(!output.contains("Likes:"));
    }

    #[test]
    fn test_unparseable_timestamp_printed_raw() {
        let formatter = TextFormatter::new(false);
        let mut post = sample_post();
        post.timestamp = Some("yesterday".to_string());

        let output = formatter.format_post_at(&post, "nasa", now());
        assert!(output.contains("Posted: yesterday"));
    }

    #[test]
    fn test_colors_only_when_enabled() {
        let plain = TextFormatter::new(false).format_post_at(&sample_post(), "nasa", now());
        let colored = TextFormatter::new(true).format_post_at(&sample_post(), "nasa", now());

        assert!(!plain.contains("\x1b["));
        assert!(colored.contains("\x1b[1m@nasa"));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(10)), "just now");
        assert_eq!(format_age(Duration::minutes(1)), "1 minute ago");
        assert_eq!(format_age(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(format_age(Duration::hours(1)), "1 hour ago");
        assert_eq!(format_age(Duration::days(3)), "3 days ago");
    }

    #[test]
    fn test_format_posted_at_rejects_garbage() {
        assert!(format_posted_at("not a date", now()).is_none());
        assert!(format_posted_at("2024-03-01T14:00:00.000Z", now()).is_some());
    }

    #[test]
    fn test_format_attempts_ledger() {
        let formatter = TextFormatter::new(false);
        let attempts = vec![
            FetchAttempt::failure(
                "instagram.browser",
                FetchKind::Browser,
                "Browser error: launch failed",
                StdDuration::from_millis(120),
            ),
            FetchAttempt::success("instagram.static", FetchKind::StaticHtml, StdDuration::from_millis(80)),
            FetchAttempt::skipped("instagram.api", FetchKind::OfficialApi),
        ];

        let output = formatter.format_attempts(&attempts);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("✗ instagram.browser"));
        assert!(lines[1].contains("launch failed"));
        assert!(lines[2].contains("✓ instagram.static"));
        assert!(lines[3].contains("− instagram.api"));
        assert!(lines[3].contains("not available"));
    }

    #[test]
    fn test_format_failure() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_failure("nasa", "all retrieval methods exhausted (x)");
        assert_eq!(
            output,
            "@nasa: No post retrieved - all retrieval methods exhausted (x)"
        );
    }

    #[test]
    fn test_format_strategy_line() {
        let formatter = TextFormatter::new(false);
        let info = StrategyInfo {
            id: "instagram.api".to_string(),
            kind: FetchKind::OfficialApi,
            available: false,
            priority: 20,
        };

        let line = formatter.format_strategy_line(&info);
        assert!(line.starts_with("instagram.api"));
        assert!(line.contains("Official API"));
        assert!(line.contains("20"));
        assert!(line.contains('−'));

        let header = formatter.format_strategies_header();
        assert!(header.contains("Strategy"));
        assert!(header.contains("Available"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use postgrab_core::{Caption, PostRecord, RetrievalSource};
    use postgrab_fetch::{FetchAttempt, FetchError, FetchKind, FetchOutcome, FetchResult};
    use std::time::Duration;

    fn success_outcome() -> FetchOutcome {
        let post = PostRecord::new(Caption::Missing, "https://cdn.example/a.jpg")
            .with_source(RetrievalSource::StaticHtml);
        FetchOutcome {
            result: Ok(FetchResult::new(post, "instagram.static", FetchKind::StaticHtml)),
            attempts: vec![
                FetchAttempt::failure(
                    "instagram.browser",
                    FetchKind::Browser,
                    "boom",
                    Duration::from_millis(5),
                ),
                FetchAttempt::success("instagram.static", FetchKind::StaticHtml, Duration::from_millis(7)),
            ],
            duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_format_success_outcome() {
        let formatter = JsonFormatter::new(false);
        let json = formatter.format_outcome(&success_outcome(), "nasa").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["profile"], "nasa");
        assert_eq!(value["status"], "success");
        assert_eq!(value["strategy"], "instagram.static");
        assert_eq!(value["post"]["caption"], "No caption");
        assert_eq!(value["post"]["captionStatus"], "missing");
        assert_eq!(value["post"]["imageUrl"], "https://cdn.example/a.jpg");
        assert_eq!(value["attempts"].as_array().unwrap().len(), 2);
        assert_eq!(value["attempts"][0]["status"], "failed");
        assert_eq!(value["attempts"][0]["error"], "boom");
        assert_eq!(value["durationMs"], 12);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_format_failure_outcome() {
        let outcome = FetchOutcome {
            result: Err(FetchError::AllStrategiesFailed(
                "instagram.static: timed out".to_string(),
            )),
            attempts: vec![FetchAttempt::skipped("instagram.api", FetchKind::OfficialApi)],
            duration: Duration::ZERO,
        };

        let formatter = JsonFormatter::new(true);
        let json = formatter.format_outcome(&outcome, "nasa").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "failure");
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("all retrieval methods exhausted"));
        assert!(value.get("post").is_none());
        assert_eq!(value["attempts"][0]["status"], "skipped");
        assert!(json.contains('\n'));
    }
}
