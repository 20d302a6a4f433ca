//! Rendered-page scraping through a headless browser session.
//!
//! The flow is: profile page, settle, consent dialog, post link cascade,
//! post page, container cascade, then caption, image and time extraction.
//! The session is always closed before returning.

use postgrab_core::{Caption, PostRecord, TargetConfig};
use postgrab_fetch::{
    ArtifactKind, BrowserError, BrowserSession, DomElement, FetchContext, FetchSettings,
    ReadyState, SessionProfile, first_match_async, random_identity,
};
use futures::FutureExt;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

use super::error::InstagramError;
use super::parser::{CANONICAL_BASE, parse_datetime_attr};
use super::selectors::{
    CAPTION_SELECTORS, CONSENT_SELECTORS, CONTAINER_SELECTORS, IMAGE_SELECTORS,
    MIN_CAPTION_CHARS, MIN_IMAGE_PIXELS, POST_LINK_SELECTORS, TIME_SELECTORS, absolutize,
    is_media_host, is_post_path, shortcode_from_path,
};

/// Drives a browser session through the profile and post pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstagramBrowserScraper;

impl InstagramBrowserScraper {
    /// Creates a new scraper.
    pub fn new() -> Self {
        Self
    }

    /// Launches a session, scrapes the latest post, and closes the session.
    #[instrument(skip(self, ctx, target), fields(profile = %target.identifier()))]
    pub async fn fetch_latest(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<PostRecord, InstagramError> {
        let identity = random_identity();
        let profile = SessionProfile {
            user_agent: identity.user_agent.to_string(),
            headers: identity.extra_browser_headers(),
            viewport: ctx.settings.viewport,
        };

        let session = ctx.browser.launch(&profile).await?;
        let result = scrape(session.as_ref(), &ctx.settings, target).await;

        if let Err(e) = &result {
            debug!(error = %e, "Browser scrape failed");
            if ctx.artifacts.enabled() {
                dump_artifacts(session.as_ref(), ctx).await;
            }
        }

        session.close().await;
        result
    }
}

// ============================================================================
// Steps
// ============================================================================

async fn scrape(
    session: &dyn BrowserSession,
    settings: &FetchSettings,
    target: &TargetConfig,
) -> Result<PostRecord, InstagramError> {
    let profile_url = target.profile_url(&settings.profile_base_url);
    open_profile(session, &profile_url, settings).await?;
    settle(settings).await;
    dismiss_consent(session).await;

    let links = collect_post_links(session, &settings.profile_base_url).await?;
    let post_url = links
        .into_iter()
        .next()
        .ok_or(InstagramError::NoPostLinks)?;
    debug!(url = %post_url, "Opening latest post");

    session
        .navigate(&post_url, ReadyState::Complete, settings.navigation_timeout)
        .await?;
    confirm_container(session).await?;

    let caption = extract_caption(session).await;
    let image_url = extract_image(session).await?;
    let timestamp = extract_timestamp(session).await;

    Ok(PostRecord::new(caption, image_url)
        .with_id(shortcode_from_path(&post_url).map(str::to_string))
        .with_timestamp(timestamp)
        .with_post_url(Some(canonical_post_url(&post_url))))
}

/// Strict navigation, then exactly one relaxed retry.
async fn open_profile(
    session: &dyn BrowserSession,
    url: &str,
    settings: &FetchSettings,
) -> Result<(), BrowserError> {
    match session
        .navigate(url, ReadyState::Complete, settings.navigation_timeout)
        .await
    {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(error = %e, "Profile navigation failed, retrying with relaxed readiness");
            session
                .navigate(
                    url,
                    ReadyState::Interactive,
                    settings.relaxed_navigation_timeout,
                )
                .await
        }
    }
}

async fn settle(settings: &FetchSettings) {
    let jitter_ms = u64::try_from(settings.settle_jitter.as_millis()).unwrap_or(u64::MAX);
    let extra = if jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ms)
    };
    let delay = settings.settle_delay + Duration::from_millis(extra);
    if !delay.is_zero() {
        trace!(delay_ms = delay.as_millis(), "Settling");
        tokio::time::sleep(delay).await;
    }
}

async fn dismiss_consent(session: &dyn BrowserSession) {
    for selector in CONSENT_SELECTORS {
        match session.click_first(selector).await {
            Ok(true) => {
                debug!(selector, "Dismissed consent dialog");
                return;
            }
            Ok(false) => {}
            Err(e) => trace!(selector, error = %e, "Consent click failed"),
        }
    }
}

/// Post links from the first selector that yields any.
async fn collect_post_links(
    session: &dyn BrowserSession,
    base: &str,
) -> Result<Vec<String>, InstagramError> {
    let hit = first_match_async(POST_LINK_SELECTORS.iter().copied(), |selector| async move {
        let elements = match session.query_all(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                trace!(selector, error = %e, "Post link query failed");
                return None;
            }
        };
        let links: Vec<String> = elements
            .iter()
            .filter_map(DomElement::link)
            .filter(|href| is_post_path(href))
            .map(|href| absolutize(href, base))
            .collect();
        (!links.is_empty()).then_some(links)
    }
    .boxed())
    .boxed()
    .await
    .ok_or(InstagramError::NoPostLinks)?;

    debug!(
        selector = hit.candidate,
        index = hit.index,
        links = hit.value.len(),
        "Post link selector matched"
    );
    Ok(hit.value)
}

async fn confirm_container(session: &dyn BrowserSession) -> Result<(), InstagramError> {
    let hit = first_match_async(CONTAINER_SELECTORS.iter().copied(), |selector| async move {
        let elements = session.query_all(selector).await.ok()?;
        (!elements.is_empty()).then_some(())
    }
    .boxed())
    .boxed()
    .await
    .ok_or(InstagramError::ContainerNotRendered)?;

    trace!(selector = hit.candidate, "Post container rendered");
    Ok(())
}

async fn extract_caption(session: &dyn BrowserSession) -> Caption {
    let hit = first_match_async(CAPTION_SELECTORS.iter().copied(), |selector| async move {
        let elements = session.query_all(selector).await.ok()?;
        elements
            .into_iter()
            .map(|el| el.text)
            .find(|text| text.trim().chars().count() > MIN_CAPTION_CHARS)
    }
    .boxed())
    .boxed()
    .await;

    Caption::from_text(hit.map(|h| h.value))
}

async fn extract_image(session: &dyn BrowserSession) -> Result<String, InstagramError> {
    let hit = first_match_async(IMAGE_SELECTORS.iter().copied(), |selector| async move {
        let elements = session.query_all(selector).await.ok()?;
        elements
            .iter()
            .find_map(|el| el.source().filter(|s| !s.is_empty()).map(str::to_string))
    }
    .boxed())
    .boxed()
    .await;

    if let Some(hit) = hit {
        return Ok(hit.value);
    }

    debug!("No image selector matched, scanning all images");
    let images = session.query_all("img").await?;
    images
        .iter()
        .filter(|img| img.width > MIN_IMAGE_PIXELS && img.height > MIN_IMAGE_PIXELS)
        .find_map(|img| img.source().filter(|src| is_media_host(src)))
        .map(str::to_string)
        .ok_or(InstagramError::NoImage)
}

async fn extract_timestamp(session: &dyn BrowserSession) -> Option<String> {
    first_match_async(TIME_SELECTORS.iter().copied(), |selector| async move {
        let elements = session.query_all(selector).await.ok()?;
        elements
            .iter()
            .find_map(|el| el.attr("datetime").and_then(parse_datetime_attr))
    }
    .boxed())
    .boxed()
    .await
    .map(|hit| hit.value)
}

fn canonical_post_url(url: &str) -> String {
    match shortcode_from_path(url) {
        Some(code) => format!("{CANONICAL_BASE}/p/{code}/"),
        None => url.to_string(),
    }
}

async fn dump_artifacts(session: &dyn BrowserSession, ctx: &FetchContext) {
    match session.content().await {
        Ok(html) => ctx
            .artifacts
            .write(ArtifactKind::RenderedMarkup, html.as_bytes()),
        Err(e) => trace!(error = %e, "Could not capture rendered markup"),
    }
    match session.screenshot().await {
        Ok(png) => ctx.artifacts.write(ArtifactKind::Screenshot, &png),
        Err(e) => trace!(error = %e, "Could not capture screenshot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_post_url() {
        assert_eq!(
            canonical_post_url("http://127.0.0.1:9/reel/xyz/?igsh=1"),
            "https://www.instagram.com/p/xyz/"
        );
        assert_eq!(canonical_post_url("https://x/other"), "https://x/other");
    }

    #[tokio::test]
    async fn test_settle_without_delay_returns() {
        let settings = FetchSettings::default().without_delays();
        tokio::time::timeout(Duration::from_millis(200), settle(&settings))
            .await
            .unwrap();
    }
}
