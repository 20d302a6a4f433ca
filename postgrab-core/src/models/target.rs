//! Target configuration.
//!
//! A [`TargetConfig`] names the profile whose latest post is retrieved and
//! optionally carries a bearer credential for the official API.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::CoreError;

/// Identifier used when none (or an empty one) is supplied.
pub const DEFAULT_IDENTIFIER: &str = "instagram";

// ============================================================================
// Target Config
// ============================================================================

/// The profile to retrieve from, plus an optional API credential.
///
/// The identifier is always a valid handle: construction, reconfiguration
/// and deserialization all fall back to [`DEFAULT_IDENTIFIER`] when the
/// supplied value is empty or fails [`validate_identifier`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(deserialize_with = "deserialize_identifier")]
    identifier: String,
    #[serde(default, skip_serializing)]
    credential: Option<String>,
}

impl TargetConfig {
    /// Creates a target for the given identifier without a credential.
    pub fn new(identifier: impl AsRef<str>) -> Self {
        Self {
            identifier: identifier_or_default(identifier.as_ref()),
            credential: None,
        }
    }

    /// Sets the bearer credential. Blank credentials are treated as absent.
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self
    }

    /// Returns the normalised identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the bearer credential, if configured.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Returns true if a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Overwrites the identifier. Never fails.
    pub fn set_identifier(&mut self, identifier: impl AsRef<str>) {
        self.identifier = identifier_or_default(identifier.as_ref());
    }

    /// Returns the profile URL under the given site base.
    pub fn profile_url(&self, base: &str) -> String {
        format!("{}/{}/", base.trim_end_matches('/'), self.identifier)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTIFIER)
    }
}

// The credential must never reach logs.
impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("identifier", &self.identifier)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn identifier_or_default(raw: &str) -> String {
    validate_identifier(raw).unwrap_or_else(|_| DEFAULT_IDENTIFIER.to_string())
}

fn deserialize_identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(identifier_or_default(&raw))
}

// ============================================================================
// Identifier Normalisation
// ============================================================================

/// Reduces user input to a bare handle.
///
/// Accepts `name`, `@name`, and full profile URLs such as
/// `https://www.instagram.com/name/`. Returns `None` if nothing is left.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    let handle = if trimmed.contains("://") {
        let parsed = Url::parse(trimmed).ok()?;
        parsed
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .map(str::to_string)?
    } else {
        trimmed.trim_matches('/').to_string()
    };

    let handle = handle.trim_start_matches('@').trim();
    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

/// Strict validation used when persisting an identifier.
///
/// Handles consist of ASCII letters, digits, `.` and `_`, at most 30
/// characters.
pub fn validate_identifier(raw: &str) -> Result<String, CoreError> {
    let handle = normalize_identifier(raw)
        .ok_or_else(|| CoreError::InvalidIdentifier("identifier is empty".to_string()))?;

    if handle.len() > 30 {
        return Err(CoreError::InvalidIdentifier(format!(
            "'{handle}' is longer than 30 characters"
        )));
    }

    if let Some(bad) = handle
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_'))
    {
        return Err(CoreError::InvalidIdentifier(format!(
            "'{handle}' contains invalid character '{bad}'"
        )));
    }

    Ok(handle)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_variants() {
        assert_eq!(normalize_identifier("nasa").as_deref(), Some("nasa"));
        assert_eq!(normalize_identifier("  @nasa ").as_deref(), Some("nasa"));
        assert_eq!(
            normalize_identifier("https://www.instagram.com/nasa/").as_deref(),
            Some("nasa")
        );
        assert_eq!(normalize_identifier("nasa/").as_deref(), Some("nasa"));
        assert_eq!(normalize_identifier("   "), None);
        assert_eq!(normalize_identifier("@"), None);
    }

    #[test]
    fn test_empty_identifier_falls_back() {
        let target = TargetConfig::new("");
        assert_eq!(target.identifier(), DEFAULT_IDENTIFIER);

        let mut target = TargetConfig::new("nasa");
        target.set_identifier("  ");
        assert_eq!(target.identifier(), DEFAULT_IDENTIFIER);
    }

    #[test]
    fn test_invalid_identifier_falls_back() {
        let mut target = TargetConfig::new("nasa");
        target.set_identifier("a/../b");
        assert_eq!(target.identifier(), DEFAULT_IDENTIFIER);

        for raw in ["nasa?x=1", "nasa#top", "has space", "../etc"] {
            assert_eq!(TargetConfig::new(raw).identifier(), DEFAULT_IDENTIFIER, "{raw}");
        }
        assert_eq!(
            TargetConfig::new("a/../b").profile_url("https://www.instagram.com"),
            "https://www.instagram.com/instagram/"
        );
    }

    #[test]
    fn test_deserialized_identifier_is_checked() {
        let target: TargetConfig = serde_json::from_str(r#"{"identifier":"x?y"}"#).unwrap();
        assert_eq!(target.identifier(), DEFAULT_IDENTIFIER);

        let target: TargetConfig = serde_json::from_str(r#"{"identifier":"@nasa"}"#).unwrap();
        assert_eq!(target.identifier(), "nasa");
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let target = TargetConfig::new("nasa").with_credential(Some("  ".to_string()));
        assert!(!target.has_credential());

        let target = TargetConfig::new("nasa").with_credential(Some("tok".to_string()));
        assert_eq!(target.credential(), Some("tok"));
    }

    #[test]
    fn test_debug_redacts_credential() {
        let target = TargetConfig::new("nasa").with_credential(Some("secret".to_string()));
        let debug = format!("{target:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_profile_url() {
        let target = TargetConfig::new("nasa");
        assert_eq!(
            target.profile_url("https://www.instagram.com/"),
            "https://www.instagram.com/nasa/"
        );
    }

    #[test]
    fn test_validate_identifier() {
        assert_eq!(validate_identifier("@nat.geo_1").unwrap(), "nat.geo_1");
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier(&"a".repeat(31)).is_err());
    }
}
