//! Protected key detection

use crate::config::ProtectionConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::key::PropertyKey;
use regex::Regex;

/// Decides which keys are internal and must not be touched from outside
///
/// String keys are protected when they start with one of the prefixes; any
/// key (index keys included, by their decimal rendering) is protected when it
/// matches one of the patterns.
#[derive(Clone, Debug, Default)]
pub struct KeyGuard {
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl KeyGuard {
    /// Guard that protects nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard protecting keys that start with `prefix`
    pub fn prefix(prefix: &str) -> Self {
        Self::new().with_prefix(prefix)
    }

    /// The conventional guard: keys starting with `_`
    pub fn underscore() -> Self {
        Self::prefix("_")
    }

    /// Add a protected prefix; empty prefixes are ignored
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.prefixes.push(prefix.to_string());
        }
        self
    }

    /// Add a protected pattern
    pub fn with_pattern(mut self, pattern: &str) -> ProxyResult<Self> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Build from configuration
    pub fn from_config(config: &ProtectionConfig) -> ProxyResult<Self> {
        let guard = config
            .prefixes
            .iter()
            .fold(Self::new(), |guard, prefix| guard.with_prefix(prefix));
        config
            .patterns
            .iter()
            .try_fold(guard, |guard, pattern| guard.with_pattern(pattern))
    }

    /// Whether `key` is protected
    pub fn is_protected(&self, key: &PropertyKey) -> bool {
        if let Some(s) = key.as_str()
            && self.prefixes.iter().any(|p| s.starts_with(p.as_str()))
        {
            return true;
        }
        if self.patterns.is_empty() {
            return false;
        }
        let rendered = key.to_string();
        self.patterns.iter().any(|re| re.is_match(&rendered))
    }

    /// `AccessDenied` for protected keys
    pub fn check(&self, key: &PropertyKey) -> ProxyResult<()> {
        if self.is_protected(key) {
            tracing::debug!(target: "otter::proxy", key = %key, "access denied");
            Err(ProxyError::access_denied(key))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_guard() {
        let guard = KeyGuard::underscore();
        assert!(guard.is_protected(&"_password".into()));
        assert!(!guard.is_protected(&"name".into()));
        assert!(!guard.is_protected(&PropertyKey::Index(0)));
        assert!(guard.check(&"_password".into()).unwrap_err().is_access_denied());
    }

    #[test]
    fn test_patterns_apply_to_rendered_keys() {
        let guard = KeyGuard::new().with_pattern("^secret").unwrap().with_pattern("^9+$").unwrap();
        assert!(guard.is_protected(&"secretKey".into()));
        assert!(guard.is_protected(&PropertyKey::Index(99)));
        assert!(!guard.is_protected(&"public".into()));
    }

    #[test]
    fn test_from_config() {
        let config = ProtectionConfig {
            prefixes: vec!["$".into(), String::new()],
            patterns: vec!["token$".into()],
        };
        let guard = KeyGuard::from_config(&config).unwrap();
        assert!(guard.is_protected(&"$internal".into()));
        assert!(!guard.is_protected(&"authToken".into()));
        assert!(guard.is_protected(&"auth_token".into()));
        assert!(!guard.is_protected(&"plain".into()));
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let config = ProtectionConfig {
            prefixes: Vec::new(),
            patterns: vec!["(".into()],
        };
        assert!(matches!(KeyGuard::from_config(&config), Err(ProxyError::Config(_))));
    }
}
