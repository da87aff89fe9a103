//! Configuration
//!
//! Loaded from an `otter-proxy.toml` file. Every field has a default, so an
//! empty file (or no file at all) yields [`ProxyConfig::default`].
//!
//! ```toml
//! [protection]
//! prefixes = ["_"]
//! patterns = ["^secret"]
//!
//! [scheduler]
//! max_nesting_level = 5
//! min_timeout_ms = 4
//! ```

use crate::error::{ProxyError, ProxyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "otter-proxy.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Which keys count as protected
    pub protection: ProtectionConfig,
    /// Deferred call scheduling
    pub scheduler: SchedulerConfig,
}

/// Protected key rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtectionConfig {
    /// Key prefixes marking a property as internal
    pub prefixes: Vec<String>,
    /// Regular expressions; a key matching any of them is protected
    pub patterns: Vec<String>,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["_".to_string()],
            patterns: Vec::new(),
        }
    }
}

/// Timer clamping rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Timers nested deeper than this get clamped to `min_timeout_ms`
    pub max_nesting_level: u32,
    /// Minimum delay for deeply nested timers, in milliseconds
    pub min_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_nesting_level: 5,
            min_timeout_ms: 4,
        }
    }
}

impl SchedulerConfig {
    /// Minimum nested delay as a duration
    pub fn min_timeout(&self) -> Duration {
        Duration::from_millis(self.min_timeout_ms)
    }
}

impl ProxyConfig {
    /// Parse from TOML text
    pub fn from_toml_str(s: &str) -> ProxyResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ProxyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> ProxyResult<String> {
        toml::to_string(self).map_err(|e| ProxyError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = ProxyConfig::from_toml_str("").unwrap();
        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.protection.prefixes, vec!["_"]);
        assert_eq!(config.scheduler.min_timeout(), Duration::from_millis(4));
    }

    #[test]
    fn test_partial_config() {
        let config = ProxyConfig::from_toml_str(
            r#"
            [protection]
            patterns = ["^secret"]
            "#,
        )
        .unwrap();
        assert_eq!(config.protection.prefixes, vec!["_"]);
        assert_eq!(config.protection.patterns, vec!["^secret"]);
        assert_eq!(config.scheduler.max_nesting_level, 5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ProxyConfig::from_toml_str("[scheduler]\nmax_nesting = 3\n").unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = ProxyConfig::default();
        config.scheduler.min_timeout_ms = 10;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        assert_eq!(ProxyConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = ProxyConfig::load("/nonexistent/otter-proxy.toml").unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }
}
