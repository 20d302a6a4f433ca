//! Selector tables and heuristics for Instagram pages.
//!
//! Every table is ordered: the first entry that matches wins. Markup churn is
//! handled by appending new selectors, not by editing extraction code.

/// Anchors linking to a post from the profile grid.
pub const POST_LINK_SELECTORS: &[&str] = &[
    r#"article a[href*="/p/"]"#,
    r#"main a[href*="/p/"]"#,
    r#"a[href*="/p/"]"#,
    r#"a[href*="/reel/"]"#,
    r#"a[role="link"][href*="/p/"]"#,
];

/// Containers that confirm a post page rendered.
pub const CONTAINER_SELECTORS: &[&str] = &[
    "article",
    r#"main[role="main"]"#,
    r#"div[role="dialog"] article"#,
    r#"div[role="presentation"]"#,
];

/// Caption candidates, most specific first.
pub const CAPTION_SELECTORS: &[&str] = &[
    "article h1",
    r#"div[data-testid="post-comment-root"] span"#,
    r#"article ul li:first-child span[dir="auto"]"#,
    r#"span[dir="auto"]"#,
];

/// Primary image candidates.
pub const IMAGE_SELECTORS: &[&str] = &[
    "article img[srcset]",
    r#"article div[role="button"] img"#,
    r#"article img[style*="object-fit"]"#,
    r#"img[alt*="Photo by"]"#,
    r#"img[decoding="auto"]"#,
];

/// Elements carrying the publication time.
pub const TIME_SELECTORS: &[&str] = &["article time[datetime]", "time[datetime]", "a time"];

/// Cookie and login dialog dismiss buttons.
pub const CONSENT_SELECTORS: &[&str] = &[
    r#"button[class*="_a9--"]"#,
    r#"[role="dialog"] button:last-child"#,
    r#"button[data-cookiebanner="accept_button"]"#,
];

/// Path fragments that identify a post permalink.
pub const POST_PATH_MARKERS: &[&str] = &["/p/", "/reel/"];

/// Hosts that serve post media.
pub const IMAGE_HOST_MARKERS: &[&str] = &["cdninstagram.com", "fbcdn.net"];

/// Captions must be longer than this many characters.
pub const MIN_CAPTION_CHARS: usize = 5;

/// Heuristic images must be wider and taller than this, in CSS pixels.
pub const MIN_IMAGE_PIXELS: f64 = 150.0;

/// Returns true if `href` points at a post.
pub fn is_post_path(href: &str) -> bool {
    POST_PATH_MARKERS.iter().any(|m| href.contains(m))
}

/// Returns true if `src` is served from a media host.
pub fn is_media_host(src: &str) -> bool {
    IMAGE_HOST_MARKERS.iter().any(|m| src.contains(m))
}

/// Returns the shortcode from a post URL or path.
pub fn shortcode_from_path(href: &str) -> Option<&str> {
    POST_PATH_MARKERS.iter().find_map(|marker| {
        let (_, rest) = href.split_once(marker)?;
        let code = rest.split(['/', '?', '#']).next()?;
        (!code.is_empty()).then_some(code)
    })
}

/// Makes a site-relative href absolute.
pub fn absolutize(href: &str, base: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}
