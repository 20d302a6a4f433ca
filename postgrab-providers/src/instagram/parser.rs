//! Instagram profile document parsing.
//!
//! Two stages, in order:
//!
//! 1. **Embedded state**: inline scripts that assign page state as JSON.
//!    Each JSON block is searched with a tagged list of (path, extractor)
//!    pairs; the first fully-populated post wins.
//! 2. **Markup**: the first post link plus the first media-host image. The
//!    caption is marked unavailable.

use postgrab_core::{Caption, PostRecord, normalize_timestamp, unix_to_iso8601};
use postgrab_fetch::first_match;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, trace};

use super::error::InstagramError;
use super::selectors::{absolutize, is_media_host, is_post_path, shortcode_from_path};

/// Canonical site used for permalinks.
pub const CANONICAL_BASE: &str = "https://www.instagram.com";

// ============================================================================
// Script Patterns
// ============================================================================

/// Known assignment patterns that embed JSON in inline scripts.
const SCRIPT_PATTERNS: &[(&str, &str)] = &[
    ("shared_data", r"(?s)window\._sharedData\s*=\s*(\{.*\})\s*;?\s*$"),
    (
        "additional_data",
        r"(?s)window\.__additionalDataLoaded\(\s*['\x22][^'\x22]*['\x22]\s*,\s*(\{.*\})\s*\)\s*;?\s*$",
    ),
    ("initial_data", r"(?s)window\.__initialData\s*=\s*(\{.*\})\s*;?\s*$"),
];

static COMPILED_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SCRIPT_PATTERNS
        .iter()
        .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (*name, re)))
        .collect()
});

// ============================================================================
// Embedded State Schemas
// ============================================================================

type Extractor = fn(&Value) -> Option<PostRecord>;

/// Where media edge lists have lived across page versions.
const EDGE_PATHS: &[(&str, Extractor)] = &[
    (
        "/entry_data/ProfilePage/0/graphql/user/edge_owner_to_timeline_media/edges",
        graph_edge,
    ),
    (
        "/graphql/user/edge_owner_to_timeline_media/edges",
        graph_edge,
    ),
    ("/data/user/edge_owner_to_timeline_media/edges", graph_edge),
    ("/user/edge_owner_to_timeline_media/edges", graph_edge),
    (
        "/data/xdt_api__v1__feed__user_timeline_graphql_connection/edges",
        timeline_edge,
    ),
];

#[derive(Debug, Deserialize)]
struct GraphEdge {
    node: GraphNode,
}

#[derive(Debug, Deserialize)]
struct GraphNode {
    id: Option<String>,
    shortcode: Option<String>,
    display_url: Option<String>,
    taken_at_timestamp: Option<i64>,
    #[serde(default)]
    edge_media_to_caption: Option<TextEdges>,
    #[serde(default)]
    edge_liked_by: Option<Count>,
    #[serde(default)]
    edge_media_preview_like: Option<Count>,
}

#[derive(Debug, Deserialize)]
struct TextEdges {
    #[serde(default)]
    edges: Vec<TextEdge>,
}

#[derive(Debug, Deserialize)]
struct TextEdge {
    node: TextNode,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TimelineEdge {
    node: TimelineNode,
}

#[derive(Debug, Deserialize)]
struct TimelineNode {
    id: Option<String>,
    code: Option<String>,
    taken_at: Option<i64>,
    like_count: Option<u64>,
    caption: Option<TextNode>,
    image_versions2: Option<ImageVersions>,
}

#[derive(Debug, Deserialize)]
struct ImageVersions {
    #[serde(default)]
    candidates: Vec<ImageCandidate>,
}

#[derive(Debug, Deserialize)]
struct ImageCandidate {
    url: Option<String>,
}

fn permalink(shortcode: Option<&str>) -> Option<String> {
    shortcode
        .filter(|c| !c.is_empty())
        .map(|c| format!("{CANONICAL_BASE}/p/{c}/"))
}

fn graph_edge(edge: &Value) -> Option<PostRecord> {
    let GraphEdge { node } = GraphEdge::deserialize(edge).ok()?;
    let image_url = node.display_url.filter(|u| !u.is_empty())?;

    let caption = node
        .edge_media_to_caption
        .and_then(|c| c.edges.into_iter().next())
        .and_then(|e| e.node.text);

    let likes = node
        .edge_liked_by
        .and_then(|c| c.count)
        .or_else(|| node.edge_media_preview_like.and_then(|c| c.count));

    Some(
        PostRecord::new(Caption::from_text(caption), image_url)
            .with_id(node.id)
            .with_timestamp(node.taken_at_timestamp.and_then(unix_to_iso8601))
            .with_like_count(likes)
            .with_post_url(permalink(node.shortcode.as_deref())),
    )
}

fn timeline_edge(edge: &Value) -> Option<PostRecord> {
    let TimelineEdge { node } = TimelineEdge::deserialize(edge).ok()?;
    let image_url = node
        .image_versions2
        .and_then(|v| v.candidates.into_iter().find_map(|c| c.url))
        .filter(|u| !u.is_empty())?;

    Some(
        PostRecord::new(
            Caption::from_text(node.caption.and_then(|c| c.text)),
            image_url,
        )
        .with_id(node.id)
        .with_timestamp(node.taken_at.and_then(unix_to_iso8601))
        .with_like_count(node.like_count)
        .with_post_url(permalink(node.code.as_deref())),
    )
}

/// Searches one JSON block for the first media edge that maps to a post.
pub fn extract_from_state(state: &Value) -> Option<PostRecord> {
    first_match(EDGE_PATHS.iter().copied(), |(path, extract)| {
        let edge = state.pointer(path)?.as_array()?.first()?;
        extract(edge)
    })
    .map(|hit| {
        debug!(path = hit.candidate.0, "Embedded state matched");
        hit.value
    })
}

// ============================================================================
// Document Parsing
// ============================================================================

/// Rejects bodies that cannot be profile markup. Never retried.
pub fn check_document(body: &str) -> Result<(), InstagramError> {
    let trimmed = body.trim_start();
    if trimmed.is_empty() {
        return Err(InstagramError::EmptyDocument);
    }
    if !trimmed.starts_with('<') {
        return Err(InstagramError::NotMarkup(trimmed.chars().take(16).collect()));
    }
    Ok(())
}

/// Returns every JSON block embedded in inline scripts, in document order.
pub fn embedded_json_blocks(document: &Html) -> Vec<Value> {
    let Ok(script_selector) = Selector::parse("script") else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for script in document.select(&script_selector) {
        if script.value().attr("src").is_some() {
            continue;
        }
        let text = script.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let is_json_script = script
            .value()
            .attr("type")
            .is_some_and(|t| t.contains("json"));

        let raw = if is_json_script && text.starts_with('{') {
            Some(text)
        } else {
            COMPILED_PATTERNS.iter().find_map(|(name, re)| {
                let captures = re.captures(text)?;
                trace!(pattern = name, "Script pattern matched");
                captures.get(1).map(|m| m.as_str())
            })
        };

        if let Some(raw) = raw {
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => blocks.push(value),
                Err(e) => trace!(error = %e, "Embedded block is not valid JSON"),
            }
        }
    }
    blocks
}

/// Markup fallback: first post link plus first media-host image.
pub fn extract_from_markup(document: &Html) -> Option<PostRecord> {
    let anchors = Selector::parse("a[href]").ok()?;
    let images = Selector::parse("img[src]").ok()?;

    let href = document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| is_post_path(href))?;

    let src = document
        .select(&images)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| is_media_host(src))?;

    Some(
        PostRecord::new(Caption::Unavailable, src)
            .with_id(shortcode_from_path(href).map(str::to_string))
            .with_post_url(Some(absolutize(href, CANONICAL_BASE))),
    )
}

/// Parses a profile document into the latest post.
pub fn parse_profile_document(body: &str) -> Result<PostRecord, InstagramError> {
    check_document(body)?;
    let document = Html::parse_document(body);

    for block in embedded_json_blocks(&document) {
        if let Some(post) = extract_from_state(&block) {
            return Ok(post);
        }
    }

    debug!("No embedded state matched, trying markup");
    extract_from_markup(&document).ok_or(InstagramError::NoPostInDocument)
}

/// Normalizes a `datetime` attribute from rendered markup.
pub fn parse_datetime_attr(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| normalize_timestamp(raw))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use postgrab_core::CaptionStatus;

    fn shared_data_page(edges: &Value) -> String {
        let state = serde_json::json!({
            "entry_data": { "ProfilePage": [ { "graphql": { "user": {
                "edge_owner_to_timeline_media": { "edges": edges }
            } } } ] }
        });
        format!(
            "<html><head><script type=\"text/javascript\">window._sharedData = {state};</script></head><body></body></html>"
        )
    }

    #[test]
    fn test_shared_data_edge() {
        let edges = serde_json::json!([{
            "node": {
                "id": "X",
                "shortcode": "abc",
                "display_url": "http://img",
                "taken_at_timestamp": 0,
                "edge_media_to_caption": { "edges": [ { "node": { "text": "hello" } } ] }
            }
        }]);

        let post = parse_profile_document(&shared_data_page(&edges)).unwrap();
        assert_eq!(post.caption.as_str(), "hello");
        assert_eq!(post.image_url, "http://img");
        assert_eq!(post.timestamp.as_deref(), Some("1970-01-01T00:00:00.000Z"));
        assert!(post.post_url.as_deref().unwrap().ends_with("/p/abc/"));
        assert_eq!(post.id.as_deref(), Some("X"));
    }

    #[test]
    fn test_additional_data_timeline_schema() {
        let state = serde_json::json!({
            "data": { "xdt_api__v1__feed__user_timeline_graphql_connection": { "edges": [ {
                "node": {
                    "id": "1_2",
                    "code": "zzz",
                    "taken_at": 1_700_000_000,
                    "like_count": 42,
                    "caption": { "text": "from the timeline" },
                    "image_versions2": { "candidates": [ { "url": "https://scontent.cdninstagram.com/a.jpg" } ] }
                }
            } ] } }
        });
        let page = format!(
            "<html><script>window.__additionalDataLoaded('feed', {state});</script></html>"
        );

        let post = parse_profile_document(&page).unwrap();
        assert_eq!(post.caption.as_str(), "from the timeline");
        assert_eq!(post.like_count, Some(42));
        assert_eq!(post.post_url.as_deref(), Some("https://www.instagram.com/p/zzz/"));
        assert_eq!(post.timestamp.as_deref(), Some("2023-11-14T22:13:20.000Z"));
    }

    #[test]
    fn test_incomplete_edge_falls_through_to_markup() {
        let edges = serde_json::json!([{ "node": { "id": "X", "shortcode": "abc" } }]);
        let page = shared_data_page(&edges).replace(
            "<body></body>",
            "<body><a href=\"/p/abc/\">post</a><img src=\"https://scontent.cdninstagram.com/x.jpg\"></body>",
        );

        let post = parse_profile_document(&page).unwrap();
        assert_eq!(post.caption.status(), CaptionStatus::Unavailable);
        assert_eq!(post.image_url, "https://scontent.cdninstagram.com/x.jpg");
        assert_eq!(post.post_url.as_deref(), Some("https://www.instagram.com/p/abc/"));
    }

    #[test]
    fn test_markup_requires_both_link_and_image() {
        let page = "<html><body><a href=\"/p/abc/\">post</a><img src=\"https://other.example/x.jpg\"></body></html>";
        assert!(matches!(
            parse_profile_document(page),
            Err(InstagramError::NoPostInDocument)
        ));
    }

    #[test]
    fn test_rejects_empty_and_non_markup() {
        assert!(matches!(
            parse_profile_document("   "),
            Err(InstagramError::EmptyDocument)
        ));
        assert!(matches!(
            parse_profile_document("{\"require_login\":true}"),
            Err(InstagramError::NotMarkup(_))
        ));
    }

    #[test]
    fn test_json_script_block() {
        let page = r#"<html><script type="application/json">{"user":{"edge_owner_to_timeline_media":{"edges":[{"node":{"display_url":"https://img/1.jpg","shortcode":"q1"}}]}}}</script></html>"#;
        let post = parse_profile_document(page).unwrap();
        assert_eq!(post.image_url, "https://img/1.jpg");
        assert_eq!(post.caption.status(), CaptionStatus::Missing);
    }

    #[test]
    fn test_datetime_attr() {
        assert_eq!(
            parse_datetime_attr("2024-01-02T03:04:05.000Z").as_deref(),
            Some("2024-01-02T03:04:05.000Z")
        );
        assert_eq!(parse_datetime_attr(" "), None);
    }
}
