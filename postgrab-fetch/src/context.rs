//! Fetch context providing access to host APIs.
//!
//! The fetch context is passed to all strategies and provides unified
//! access to the HTTP client, the browser launcher, the diagnostic sink,
//! and the retrieval settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::artifacts::{DiagnosticSink, DirectorySink, NoopSink};
use crate::host::browser::{BrowserLauncher, ChromiumLauncher, Viewport};
use crate::host::http::HttpClient;
use crate::retry::RetryStrategy;

/// Default profile site.
pub const DEFAULT_PROFILE_BASE_URL: &str = "https://www.instagram.com";

/// Default Graph API host.
pub const DEFAULT_API_BASE_URL: &str = "https://graph.instagram.com";

/// Default overall retrieval budget. Covers strict plus relaxed navigation.
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// Source Mode
// ============================================================================

/// Which strategies a pipeline may include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// All strategies in priority order.
    #[default]
    Auto,
    /// Only the headless browser strategy.
    Browser,
    /// Only the static document strategy.
    Static,
    /// Only the official API strategy.
    Api,
}

impl SourceMode {
    /// Returns true if this mode allows the browser strategy.
    pub fn allows_browser(&self) -> bool {
        matches!(self, Self::Auto | Self::Browser)
    }

    /// Returns true if this mode allows the static strategy.
    pub fn allows_static(&self) -> bool {
        matches!(self, Self::Auto | Self::Static)
    }

    /// Returns true if this mode allows the API strategy.
    pub fn allows_api(&self) -> bool {
        matches!(self, Self::Auto | Self::Api)
    }
}

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Which strategies to allow.
    pub source_mode: SourceMode,
    /// Overall budget for one retrieval, every strategy included.
    pub timeout: Duration,
    /// Timeout for a single static fetch attempt.
    pub request_timeout: Duration,
    /// Retry policy for the static fetch.
    pub retry: RetryStrategy,
    /// Navigation timeout with strict readiness.
    pub navigation_timeout: Duration,
    /// Navigation timeout for the single relaxed retry.
    pub relaxed_navigation_timeout: Duration,
    /// Fixed part of the post-navigation settle delay.
    pub settle_delay: Duration,
    /// Upper bound on the random part of the settle delay.
    pub settle_jitter: Duration,
    /// Browser window size.
    pub viewport: Viewport,
    /// Profile site base URL.
    pub profile_base_url: String,
    /// Official API base URL.
    pub api_base_url: String,
    /// Whether to write diagnostic artifacts.
    pub dump_artifacts: bool,
    /// Where to write artifacts. Defaults to the user cache dir.
    pub artifact_dir: Option<PathBuf>,
    /// Hosts the HTTP client may contact, subdomains included. `None` allows any.
    pub allowed_domains: Option<Vec<String>>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            source_mode: SourceMode::Auto,
            timeout: DEFAULT_RETRIEVAL_TIMEOUT,
            request_timeout: Duration::from_secs(10),
            retry: RetryStrategy::default(),
            navigation_timeout: Duration::from_secs(30),
            relaxed_navigation_timeout: Duration::from_secs(60),
            settle_delay: Duration::from_millis(2000),
            settle_jitter: Duration::from_millis(1500),
            viewport: Viewport::default(),
            profile_base_url: DEFAULT_PROFILE_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            dump_artifacts: false,
            artifact_dir: None,
            allowed_domains: None,
        }
    }
}

impl FetchSettings {
    /// Restricts the pipeline to one strategy.
    pub fn with_source_mode(mut self, mode: SourceMode) -> Self {
        self.source_mode = mode;
        self
    }

    /// Sets the overall retrieval budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts outbound HTTP to the given domains.
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Enables artifact dumping.
    pub fn with_artifacts(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_artifacts = true;
        self.artifact_dir = dir;
        self
    }

    /// Points both endpoints at a local server.
    pub fn with_base_urls(mut self, profile: impl Into<String>, api: impl Into<String>) -> Self {
        self.profile_base_url = profile.into();
        self.api_base_url = api.into();
        self
    }

    /// Removes every wait. Used by tests.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay = Duration::ZERO;
        self.settle_jitter = Duration::ZERO;
        self.retry = self
            .retry
            .with_base_delay(Duration::ZERO)
            .with_jitter(Duration::ZERO);
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to fetch strategies, giving access to host APIs.
pub struct FetchContext {
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Headless browser launcher.
    pub browser: Arc<dyn BrowserLauncher>,
    /// Diagnostic artifact sink.
    pub artifacts: Arc<dyn DiagnosticSink>,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a new fetch context with default host API implementations.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a context with custom settings.
    pub fn with_settings(settings: FetchSettings) -> Self {
        Self::builder().settings(settings).build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the overall retrieval budget.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn default_sink(settings: &FetchSettings) -> Arc<dyn DiagnosticSink> {
    if !settings.dump_artifacts {
        return Arc::new(NoopSink);
    }
    match settings
        .artifact_dir
        .clone()
        .or_else(DirectorySink::default_dir)
    {
        Some(dir) => {
            warn!(
                dir = %dir.display(),
                "Artifact dumping enabled; raw page content will be written to disk"
            );
            Arc::new(DirectorySink::new(dir))
        }
        None => {
            warn!("No cache directory available; artifact dumping disabled");
            Arc::new(NoopSink)
        }
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
pub struct FetchContextBuilder {
    http: Option<Arc<HttpClient>>,
    browser: Option<Arc<dyn BrowserLauncher>>,
    artifacts: Option<Arc<dyn DiagnosticSink>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            http: None,
            browser: None,
            artifacts: None,
            settings: FetchSettings::default(),
        }
    }

    /// Sets the HTTP client.
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the browser launcher.
    pub fn browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Sets the diagnostic sink.
    pub fn artifacts(mut self, artifacts: Arc<dyn DiagnosticSink>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Sets the fetch settings.
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the source mode.
    pub fn source_mode(mut self, mode: SourceMode) -> Self {
        self.settings.source_mode = mode;
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        let timeout = self.settings.timeout;
        let artifacts = self
            .artifacts
            .unwrap_or_else(|| default_sink(&self.settings));
        let allowed_domains = self.settings.allowed_domains.clone();
        FetchContext {
            http: self.http.unwrap_or_else(|| {
                let client = HttpClient::with_timeout(timeout);
                Arc::new(match allowed_domains {
                    Some(domains) => client.with_allowed_domains(domains),
                    None => client,
                })
            }),
            browser: self
                .browser
                .unwrap_or_else(|| Arc::new(ChromiumLauncher::new())),
            artifacts,
            settings: self.settings,
        }
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_mode_allows() {
        assert!(SourceMode::Auto.allows_browser());
        assert!(SourceMode::Auto.allows_static());
        assert!(SourceMode::Auto.allows_api());

        assert!(SourceMode::Browser.allows_browser());
        assert!(!SourceMode::Browser.allows_static());

        assert!(!SourceMode::Api.allows_static());
        assert!(SourceMode::Api.allows_api());
    }

    #[test]
    fn test_source_mode_serde() {
        let mode: SourceMode = serde_json::from_str("\"static\"").unwrap();
        assert_eq!(mode, SourceMode::Static);
    }

    #[test]
    fn test_context_builder() {
        let ctx = FetchContext::builder()
            .source_mode(SourceMode::Static)
            .timeout(Duration::from_secs(60))
            .build();

        assert_eq!(ctx.settings.source_mode, SourceMode::Static);
        assert_eq!(ctx.settings.timeout, Duration::from_secs(60));
        assert!(!ctx.artifacts.enabled());
    }

    #[test]
    fn test_default_settings() {
        let settings = FetchSettings::default();
        assert_eq!(settings.source_mode, SourceMode::Auto);
        assert!(settings.relaxed_navigation_timeout > settings.navigation_timeout);
        assert_eq!(settings.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_allowlist_reaches_http_client() {
        let settings =
            FetchSettings::default().with_allowed_domains(vec!["instagram.com".to_string()]);
        let ctx = FetchContext::with_settings(settings);

        let err = ctx.http.get("http://127.0.0.1:9/nasa/").await.unwrap_err();
        assert!(matches!(err, crate::error::HttpError::DomainNotAllowed(_)));
    }

    #[test]
    fn test_artifact_dir_enables_sink() {
        let tmp = tempfile::TempDir::new().unwrap();
        let settings = FetchSettings::default().with_artifacts(Some(tmp.path().to_path_buf()));
        let ctx = FetchContext::with_settings(settings);
        assert!(ctx.artifacts.enabled());
    }
}
