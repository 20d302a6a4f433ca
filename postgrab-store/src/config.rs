//! Configuration management.
//!
//! The config file is JSON at `<config_dir>/postgrab/config.json`. A missing
//! file means defaults. The bearer credential never lives in the file: only
//! the name of the environment variable holding it.

use postgrab_core::{DEFAULT_IDENTIFIER, TargetConfig, validate_identifier};
use postgrab_fetch::{FetchSettings, RetryStrategy, SourceMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, save_json};

/// Default environment variable for the Graph API credential.
pub const DEFAULT_CREDENTIAL_ENV: &str = "INSTAGRAM_ACCESS_TOKEN";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Which profile to read.
    #[serde(default)]
    pub target: TargetSection,
    /// Retrieval tuning.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Overall retrieval budget in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Target profile settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSection {
    /// Profile handle.
    #[serde(default = "default_identifier")]
    pub identifier: String,
    /// Environment variable holding the Graph API bearer token.
    #[serde(default = "default_credential_env")]
    pub credential_env: String,
}

/// Retrieval tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Which strategies to run.
    pub source: SourceMode,
    /// Static fetch attempts, including the first.
    pub retry_attempts: u32,
    /// Delay before the first static retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on random retry jitter, in milliseconds.
    pub jitter_ms: u64,
    /// Fixed part of the browser settle delay, in milliseconds.
    pub settle_delay_ms: u64,
    /// Write diagnostic artifacts on extraction failure.
    pub dump_artifacts: bool,
    /// Artifact directory. Defaults to the user cache dir.
    pub artifact_dir: Option<PathBuf>,
    /// Domains outbound HTTP may reach, subdomains included. Empty allows any.
    pub allowed_domains: Vec<String>,
}

/// Default outbound allowlist. Covers the profile site and the Graph API host.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &["instagram.com"];

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_timeout_secs() -> u64 {
    FetchSettings::default().timeout.as_secs()
}

fn default_identifier() -> String {
    DEFAULT_IDENTIFIER.to_string()
}

fn default_credential_env() -> String {
    DEFAULT_CREDENTIAL_ENV.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            credential_env: default_credential_env(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let retry = RetryStrategy::default();
        let settings = FetchSettings::default();
        Self {
            source: SourceMode::Auto,
            retry_attempts: retry.max_attempts,
            base_delay_ms: duration_ms(retry.base_delay),
            jitter_ms: duration_ms(retry.jitter),
            settle_delay_ms: duration_ms(settings.settle_delay),
            dump_artifacts: false,
            artifact_dir: None,
            allowed_domains: DEFAULT_ALLOWED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from a specific path. A missing file yields defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        match load_json(path).await {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Saves configuration to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path()).await
    }

    /// Saves configuration to a specific path.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validates and stores a new default identifier.
    pub fn set_target(&mut self, raw: &str) -> Result<(), StoreError> {
        self.target.identifier = validate_identifier(raw)?;
        Ok(())
    }

    /// Builds fetch settings from this configuration.
    pub fn to_fetch_settings(&self) -> FetchSettings {
        let r = &self.retrieval;
        let mut settings = FetchSettings::default()
            .with_source_mode(r.source)
            .with_timeout(Duration::from_secs(self.general.timeout_secs.max(1)));

        settings.retry = RetryStrategy::new(r.retry_attempts)
            .with_base_delay(Duration::from_millis(r.base_delay_ms))
            .with_jitter(Duration::from_millis(r.jitter_ms));
        settings.settle_delay = Duration::from_millis(r.settle_delay_ms);

        if r.dump_artifacts {
            settings = settings.with_artifacts(r.artifact_dir.clone());
        }
        if !r.allowed_domains.is_empty() {
            settings = settings.with_allowed_domains(r.allowed_domains.clone());
        }
        settings
    }

    /// Builds the target, reading the credential from the process environment.
    pub fn to_target(&self) -> TargetConfig {
        self.to_target_with(|name| std::env::var(name).ok())
    }

    /// Builds the target with a custom environment lookup.
    pub fn to_target_with(&self, lookup: impl Fn(&str) -> Option<String>) -> TargetConfig {
        let credential = lookup(&self.target.credential_env);
        TargetConfig::new(&self.target.identifier).with_credential(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.target.identifier, "instagram");
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"target":{"identifier":"nasa"},"retrieval":{"source":"static"}}"#)
            .await
            .unwrap();

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.target.identifier, "nasa");
        assert_eq!(config.target.credential_env, DEFAULT_CREDENTIAL_ENV);
        assert_eq!(config.retrieval.source, SourceMode::Static);
        assert_eq!(config.retrieval.retry_attempts, 3);
    }

    #[tokio::test]
    async fn test_save_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("postgrab").join("config.json");

        let mut config = Config::default();
        config.set_target("@esa").unwrap();
        config.retrieval.dump_artifacts = true;
        config.save_to(&path).await.unwrap();

        assert_eq!(Config::load_from(&path).await.unwrap(), config);
    }

    #[test]
    fn test_set_target_rejects_garbage() {
        let mut config = Config::default();
        assert!(config.set_target("   ").is_err());
        assert!(config.set_target("not a handle!").is_err());
        assert_eq!(config.target.identifier, "instagram");
    }

    #[test]
    fn test_to_fetch_settings() {
        let mut config = Config::default();
        config.general.timeout_secs = 12;
        config.retrieval.retry_attempts = 5;
        config.retrieval.base_delay_ms = 250;
        config.retrieval.jitter_ms = 0;
        config.retrieval.settle_delay_ms = 0;

        let settings = config.to_fetch_settings();
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.base_delay, Duration::from_millis(250));
        assert!(settings.retry.jitter.is_zero());
        assert!(settings.settle_delay.is_zero());
        assert!(!settings.dump_artifacts);
        assert_eq!(
            settings.allowed_domains,
            Some(vec!["instagram.com".to_string()])
        );
    }

    #[test]
    fn test_default_budget_matches_fetch_settings() {
        let config = Config::default();
        assert_eq!(
            config.to_fetch_settings().timeout,
            FetchSettings::default().timeout
        );
    }

    #[tokio::test]
    async fn test_default_allowlist_blocks_foreign_hosts() {
        let ctx = postgrab_fetch::FetchContext::with_settings(Config::default().to_fetch_settings());
        let err = ctx.http.get("https://example.com/").await.unwrap_err();
        assert!(matches!(err, postgrab_fetch::HttpError::DomainNotAllowed(_)));

        let mut open = Config::default();
        open.retrieval.allowed_domains.clear();
        assert!(open.to_fetch_settings().allowed_domains.is_none());
    }

    #[test]
    fn test_credential_from_env_only() {
        let mut config = Config::default();
        config.target.credential_env = "POSTGRAB_TEST_TOKEN".to_string();

        let target = config.to_target_with(|name| {
            (name == "POSTGRAB_TEST_TOKEN").then(|| "abc".to_string())
        });
        assert!(target.has_credential());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("abc"));

        let bare = config.to_target_with(|_| None);
        assert!(!bare.has_credential());
    }
}
