//! Hosted backend (Supabase) connection configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Project URL (e.g. `https://abcd.supabase.co`).
    #[serde(default)]
    pub url: String,

    /// Public anonymous API key sent as `apikey` on every request.
    #[serde(default)]
    pub anon_key: String,
}

impl BackendConfig {
    /// Check if the backend config has the minimum required fields.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }

    /// Parse the project URL, rejecting anything that is not http(s).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "backend".into(),
            });
        }

        let parsed = Url::parse(self.url.trim_end_matches('/')).map_err(|e| {
            ConfigError::InvalidValue {
                field: "backend.url".into(),
                reason: e.to_string(),
            }
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(ConfigError::InvalidValue {
                field: "backend.url".into(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        assert!(!BackendConfig::default().is_configured());
    }

    #[test]
    fn configured_when_url_and_key_set() {
        let config = BackendConfig {
            url: "https://abcd.supabase.co".into(),
            anon_key: "anon".into(),
        };
        assert!(config.is_configured());
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = BackendConfig {
            url: "https://abcd.supabase.co/".into(),
            anon_key: "anon".into(),
        };
        let url = config.base_url().expect("valid url");
        assert_eq!(url.host_str(), Some("abcd.supabase.co"));
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        let config = BackendConfig {
            url: "ftp://abcd.supabase.co".into(),
            anon_key: "anon".into(),
        };
        let err = config.base_url().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn base_url_requires_url() {
        let err = BackendConfig::default().base_url().unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { .. }));
    }
}
