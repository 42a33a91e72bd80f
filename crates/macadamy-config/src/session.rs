//! Session-layer tuning: timeouts, caches and local storage.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default bound on each remote call of an organization switch, in seconds.
const fn default_switch_timeout_secs() -> u64 {
    30
}

/// Default lifetime of the organization directory cache, in seconds.
const fn default_org_cache_ttl_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Timeout applied to each remote call made while switching the primary
    /// organization. `0` disables the bound.
    #[serde(default = "default_switch_timeout_secs")]
    pub switch_timeout_secs: u64,

    /// How long organization listings are cached per profile.
    #[serde(default = "default_org_cache_ttl_secs")]
    pub org_cache_ttl_secs: u64,

    /// Directory for the local key-value store and credentials file.
    /// Empty means `~/.macadamy`.
    #[serde(default)]
    pub storage_dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            switch_timeout_secs: default_switch_timeout_secs(),
            org_cache_ttl_secs: default_org_cache_ttl_secs(),
            storage_dir: String::new(),
        }
    }
}

impl SessionConfig {
    /// Resolve the storage directory, falling back to `~/.macadamy`.
    pub fn storage_path(&self) -> Option<PathBuf> {
        if self.storage_dir.is_empty() {
            dirs::home_dir().map(|h| h.join(".macadamy"))
        } else {
            Some(PathBuf::from(&self.storage_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = SessionConfig::default();
        assert_eq!(config.switch_timeout_secs, 30);
        assert_eq!(config.org_cache_ttl_secs, 30);
        assert!(config.storage_dir.is_empty());
    }

    #[test]
    fn explicit_storage_dir_wins() {
        let config = SessionConfig {
            storage_dir: "/tmp/macadamy-test".into(),
            ..Default::default()
        };
        assert_eq!(
            config.storage_path(),
            Some(PathBuf::from("/tmp/macadamy-test"))
        );
    }
}
