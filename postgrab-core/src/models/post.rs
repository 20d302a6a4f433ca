//! Post types.
//!
//! This module contains the normalized post produced by every strategy:
//! - [`PostRecord`] - The post itself
//! - [`Caption`] - Caption with explicit present/missing/unavailable state
//! - [`RetrievalSource`] - Which strategy produced the record

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Text shown when a post has no caption.
pub const NO_CAPTION: &str = "No caption";

/// Text shown when the caption could not be extracted.
pub const CAPTION_UNAVAILABLE: &str = "Caption unavailable";

// ============================================================================
// Caption
// ============================================================================

/// Whether a caption was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionStatus {
    /// Caption text was extracted.
    Present,
    /// The post has no caption.
    Missing,
    /// The strategy could not read captions.
    Unavailable,
}

/// A post caption.
///
/// Downstream consumers that only want text use [`Caption::as_str`], which
/// never returns an empty string. On its own a caption serializes as that
/// string; [`PostRecord`] adds a sibling `captionStatus` so the state survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Caption {
    /// Extracted caption text (never empty).
    Text(String),
    /// The post has no caption.
    Missing,
    /// The caption could not be extracted by the strategy that produced the post.
    Unavailable,
}

impl Caption {
    /// Builds a caption from optional raw text. Blank text becomes [`Caption::Missing`].
    pub fn from_text(text: Option<impl Into<String>>) -> Self {
        match text.map(Into::into) {
            Some(t) if !t.trim().is_empty() => Self::Text(t.trim().to_string()),
            _ => Self::Missing,
        }
    }

    /// Returns the caption text, or a placeholder.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(t) => t,
            Self::Missing => NO_CAPTION,
            Self::Unavailable => CAPTION_UNAVAILABLE,
        }
    }

    /// Returns the caption status.
    pub fn status(&self) -> CaptionStatus {
        match self {
            Self::Text(_) => CaptionStatus::Present,
            Self::Missing => CaptionStatus::Missing,
            Self::Unavailable => CaptionStatus::Unavailable,
        }
    }

    /// Returns true if real caption text was extracted.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Rebuilds a caption from its text and an optional recorded status.
    fn from_parts(text: String, status: Option<CaptionStatus>) -> Self {
        match status {
            Some(CaptionStatus::Present) => Self::from_text(Some(text)),
            Some(CaptionStatus::Missing) => Self::Missing,
            Some(CaptionStatus::Unavailable) => Self::Unavailable,
            None => Self::from(text),
        }
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Caption> for String {
    fn from(caption: Caption) -> Self {
        match caption {
            Caption::Text(t) => t,
            other => other.as_str().to_string(),
        }
    }
}

impl From<String> for Caption {
    fn from(text: String) -> Self {
        match text.trim() {
            CAPTION_UNAVAILABLE => Caption::Unavailable,
            NO_CAPTION => Caption::Missing,
            _ => Caption::from_text(Some(text)),
        }
    }
}

// ============================================================================
// Retrieval Source
// ============================================================================

/// How a post was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    /// Rendered in a headless browser.
    Browser,
    /// Parsed from the raw profile document.
    StaticHtml,
    /// Returned by the official API.
    OfficialApi,
    /// Unknown source.
    #[default]
    Unknown,
}

impl RetrievalSource {
    /// Returns the display name for this source.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Browser => "Browser",
            Self::StaticHtml => "Static HTML",
            Self::OfficialApi => "Official API",
            Self::Unknown => "Unknown",
        }
    }
}

// ============================================================================
// Post Record
// ============================================================================

/// The normalized latest post.
///
/// Serialized with `caption` as plain text and the caption state in a
/// sibling `captionStatus` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PostRecordRepr", from = "PostRecordRepr")]
pub struct PostRecord {
    /// Source-specific post id.
    pub id: Option<String>,
    /// Caption.
    pub caption: Caption,
    /// Primary image URL.
    pub image_url: String,
    /// ISO-8601 publication time.
    pub timestamp: Option<String>,
    /// Like count.
    pub like_count: Option<u64>,
    /// Permalink to the post.
    pub post_url: Option<String>,
    /// Strategy that produced this record.
    pub source: RetrievalSource,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecordRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    caption: String,
    #[serde(default)]
    caption_status: Option<CaptionStatus>,
    image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    post_url: Option<String>,
    #[serde(default)]
    source: RetrievalSource,
}

impl From<PostRecord> for PostRecordRepr {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            caption_status: Some(post.caption.status()),
            caption: post.caption.into(),
            image_url: post.image_url,
            timestamp: post.timestamp,
            like_count: post.like_count,
            post_url: post.post_url,
            source: post.source,
        }
    }
}

impl From<PostRecordRepr> for PostRecord {
    fn from(repr: PostRecordRepr) -> Self {
        Self {
            id: repr.id,
            caption: Caption::from_parts(repr.caption, repr.caption_status),
            image_url: repr.image_url,
            timestamp: repr.timestamp,
            like_count: repr.like_count,
            post_url: repr.post_url,
            source: repr.source,
        }
    }
}

impl PostRecord {
    /// Creates a record with the two required fields.
    pub fn new(caption: Caption, image_url: impl Into<String>) -> Self {
        Self {
            id: None,
            caption,
            image_url: image_url.into(),
            timestamp: None,
            like_count: None,
            post_url: None,
            source: RetrievalSource::Unknown,
        }
    }

    /// Sets the post id.
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// Sets the timestamp.
    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the like count.
    pub fn with_like_count(mut self, like_count: Option<u64>) -> Self {
        self.like_count = like_count;
        self
    }

    /// Sets the permalink.
    pub fn with_post_url(mut self, post_url: Option<String>) -> Self {
        self.post_url = post_url;
        self
    }

    /// Sets the retrieval source.
    pub fn with_source(mut self, source: RetrievalSource) -> Self {
        self.source = source;
        self
    }

    /// Returns true if downstream consumers can use this record.
    pub fn is_usable(&self) -> bool {
        !self.image_url.trim().is_empty()
    }

    /// Validates the record.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.is_usable() {
            return Err(CoreError::InvalidData("post has no image URL".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Formats a UTC time as ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Converts Unix seconds to an ISO-8601 string.
pub fn unix_to_iso8601(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(format_timestamp)
}

/// Normalizes an ISO-8601-ish string to the [`format_timestamp`] form.
///
/// Accepts RFC 3339 and the `+0000` offset style some APIs return. Input
/// that cannot be parsed is returned unchanged.
pub fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return format_timestamp(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return format_timestamp(parsed.with_timezone(&Utc));
    }
    raw.to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_placeholders() {
        assert_eq!(Caption::from_text(None::<String>).as_str(), NO_CAPTION);
        assert_eq!(Caption::from_text(Some("   ")).as_str(), NO_CAPTION);
        assert_eq!(Caption::Unavailable.as_str(), CAPTION_UNAVAILABLE);
        assert_eq!(Caption::from_text(Some(" hi ")).as_str(), "hi");
    }

    #[test]
    fn test_caption_serializes_as_text_and_status() {
        let json = serde_json::to_value(Caption::Unavailable).unwrap();
        assert_eq!(json["text"], CAPTION_UNAVAILABLE);
        assert_eq!(json["status"], "unavailable");
    }

    #[test]
    fn test_unix_epoch() {
        assert_eq!(
            unix_to_iso8601(0).as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_normalize_graph_offset() {
        assert_eq!(
            normalize_timestamp("2024-03-01T12:30:00+0000"),
            "2024-03-01T12:30:00.000Z"
        );
        assert_eq!(
            normalize_timestamp("2024-03-01T12:30:00.250Z"),
            "2024-03-01T12:30:00.250Z"
        );
        assert_eq!(normalize_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_usable_requires_image() {
        let post = PostRecord::new(Caption::Missing, "");
        assert!(!post.is_usable());
        assert!(post.validate().is_err());

        let post = PostRecord::new(Caption::Missing, "https://cdn/img.jpg");
        assert!(post.validate().is_ok());
    }
}
