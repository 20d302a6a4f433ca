//! Headless browser sessions.
//!
//! Strategies drive pages through the [`BrowserSession`] trait and obtain
//! sessions from a [`BrowserLauncher`]. The production implementation is
//! [`ChromiumLauncher`], backed by `chromiumoxide`; tests substitute fakes
//! that serve canned DOM snapshots.
//!
//! ## Element snapshots
//!
//! Queries return [`DomElement`] snapshots taken inside the page: text,
//! attributes, resolved `href`/`src`, and the rendered size. No live element
//! handles cross the trait boundary.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

use crate::error::BrowserError;

/// Environment variable naming an explicit Chromium binary.
pub const CHROMIUM_PATH_ENV: &str = "POSTGRAB_CHROMIUM_PATH";

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-sync",
    "--no-first-run",
    "--mute-audio",
];

const STEALTH_JS: &str = r"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = { runtime: {} };
";

// ============================================================================
// Session Types
// ============================================================================

/// Page readiness required before navigation counts as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// `document.readyState == "complete"`.
    Complete,
    /// `document.readyState` is `interactive` or `complete`.
    Interactive,
}

impl ReadyState {
    /// Returns true if the page's `document.readyState` satisfies this condition.
    pub fn is_satisfied_by(&self, state: &str) -> bool {
        match self {
            Self::Complete => state == "complete",
            Self::Interactive => matches!(state, "interactive" | "complete"),
        }
    }
}

/// Browser window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

/// How a session presents itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    /// User-Agent override.
    pub user_agent: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Fixed window size.
    pub viewport: Viewport,
}

/// Snapshot of a DOM element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DomElement {
    /// Trimmed visible text.
    pub text: String,
    /// Raw attributes.
    pub attributes: HashMap<String, String>,
    /// Absolute link target, for anchors.
    pub href: Option<String>,
    /// Absolute current source, for images.
    pub src: Option<String>,
    /// Rendered width in CSS pixels.
    pub width: f64,
    /// Rendered height in CSS pixels.
    pub height: f64,
}

impl DomElement {
    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the resolved `href`, falling back to the raw attribute.
    pub fn link(&self) -> Option<&str> {
        self.href.as_deref().or_else(|| self.attr("href"))
    }

    /// Returns the resolved image source, falling back to the raw attribute.
    pub fn source(&self) -> Option<&str> {
        self.src.as_deref().or_else(|| self.attr("src"))
    }
}

// ============================================================================
// Traits
// ============================================================================

/// One isolated browser session with a single page.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigates and waits for `ready` within `timeout`.
    async fn navigate(&self, url: &str, ready: ReadyState, timeout: Duration)
    -> Result<(), BrowserError>;

    /// Returns snapshots of every element matching `selector`.
    async fn query_all(&self, selector: &str) -> Result<Vec<DomElement>, BrowserError>;

    /// Clicks the first element matching `selector`. Returns false if none matched.
    async fn click_first(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Returns the serialized DOM.
    async fn content(&self) -> Result<String, BrowserError>;

    /// Captures a full-page PNG screenshot.
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;

    /// Shuts the session down. Never fails.
    async fn close(self: Box<Self>);
}

/// Creates browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launches a new isolated session.
    async fn launch(&self, profile: &SessionProfile)
    -> Result<Box<dyn BrowserSession>, BrowserError>;
}

// ============================================================================
// Chromium
// ============================================================================

/// Finds a Chromium-family browser binary.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        warn!(path = %p, "{CHROMIUM_PATH_ENV} points to a missing file");
    }

    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches headless Chromium sessions.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    /// Creates a launcher using the auto-detected binary.
    pub fn new() -> Self {
        Self {
            executable: find_chromium(),
        }
    }
}

impl Default for ChromiumLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    #[instrument(skip(self, profile))]
    async fn launch(
        &self,
        profile: &SessionProfile,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let executable = self.executable.clone().ok_or_else(|| {
            BrowserError::ExecutableNotFound(format!(
                "no Chromium binary on PATH; set {CHROMIUM_PATH_ENV}"
            ))
        })?;

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .viewport(Some(CdpViewport {
                width: profile.viewport.width,
                height: profile.viewport.height,
                device_scale_factor: Some(1.0),
                ..Default::default()
            }))
            .window_size(profile.viewport.width, profile.viewport.height)
            .args(LAUNCH_ARGS.iter().copied())
            .build()
            .map_err(BrowserError::LaunchFailed)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match prepare_page(&browser, profile).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(e);
            }
        };

        debug!("Browser session launched");
        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
        }))
    }
}

async fn prepare_page(browser: &Browser, profile: &SessionProfile) -> Result<Page, BrowserError> {
    let page = browser.new_page("about:blank").await?;

    page.execute(SetUserAgentOverrideParams::new(profile.user_agent.clone()))
        .await?;

    if !profile.headers.is_empty() {
        let headers: serde_json::Map<String, serde_json::Value> = profile
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(
            serde_json::Value::Object(headers),
        )))
        .await?;
    }

    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS))
        .await?;

    Ok(page)
}

/// A live Chromium session.
///
/// Dropping the session without [`BrowserSession::close`] still stops the
/// event handler, and dropping the inner `Browser` kills the child process.
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

impl ChromiumSession {
    async fn ready_state(&self) -> Result<String, BrowserError> {
        let value = self.page.evaluate("document.readyState").await?;
        value
            .into_value::<String>()
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    async fn wait_until(&self, ready: ReadyState) -> Result<(), BrowserError> {
        loop {
            // Evaluation fails while the new document is being committed.
            match self.ready_state().await {
                Ok(state) if ready.is_satisfied_by(&state) => return Ok(()),
                Ok(state) => trace!(state = %state, "Waiting for readiness"),
                Err(e) => trace!(error = %e, "Readiness probe failed"),
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    #[instrument(skip(self), fields(url = %url))]
    async fn navigate(
        &self,
        url: &str,
        ready: ReadyState,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let navigation = async {
            let response = self.page.execute(NavigateParams::new(url)).await?;
            if let Some(reason) = response.result.error_text.clone() {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason,
                });
            }
            self.wait_until(ready).await
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<DomElement>, BrowserError> {
        let script = snapshot_script(selector)?;
        let value = self.page.evaluate(script).await?;
        value
            .into_value::<Vec<DomElement>>()
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    async fn click_first(&self, selector: &str) -> Result<bool, BrowserError> {
        let selector_json =
            serde_json::to_string(selector).map_err(|e| BrowserError::Protocol(e.to_string()))?;
        let script = format!(
            "(() => {{ const el = document.querySelector({selector_json}); \
             if (!el) return false; el.click(); return true; }})()"
        );
        let value = self.page.evaluate(script).await?;
        value
            .into_value::<bool>()
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(self.page.content().await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn close(self: Box<Self>) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                debug!(error = %e, "Browser close command failed");
            }
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "Waiting for browser exit failed");
            }
        }
        self.handler_task.abort();
        debug!("Browser session closed");
    }
}

/// Builds the in-page script that snapshots every match of `selector`.
fn snapshot_script(selector: &str) -> Result<String, BrowserError> {
    let selector_json =
        serde_json::to_string(selector).map_err(|e| BrowserError::Protocol(e.to_string()))?;
    Ok(format!(
        r"(() => Array.from(document.querySelectorAll({selector_json})).map((el) => {{
            const rect = el.getBoundingClientRect();
            const attributes = {{}};
            for (const attr of el.attributes) {{ attributes[attr.name] = attr.value; }}
            return {{
                text: (el.innerText || el.textContent || '').trim(),
                attributes,
                href: typeof el.href === 'string' ? el.href : null,
                src: el.currentSrc || (typeof el.src === 'string' ? el.src : null) || null,
                width: rect.width,
                height: rect.height,
            }};
        }}))()"
    ))
}

// ============================================================================
// Tests
// ============================================================================
