//! Demo environment configuration.

use serde::{Deserialize, Serialize};

/// Default demo session lifetime, in hours.
const fn default_session_ttl_hours() -> u32 {
    12
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoConfig {
    /// Email of the shared demo auth account.
    #[serde(default)]
    pub user_email: String,

    /// Password of the shared demo auth account.
    #[serde(default)]
    pub user_password: String,

    /// Email of the profile every demo clone is copied from.
    #[serde(default)]
    pub base_profile_email: String,

    /// How long a cloned demo session is reused before re-cloning.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            user_email: String::new(),
            user_password: String::new(),
            base_profile_email: String::new(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl DemoConfig {
    /// Demo login needs both the shared credentials and a clone source.
    pub fn is_configured(&self) -> bool {
        !self.user_email.is_empty()
            && !self.user_password.is_empty()
            && !self.base_profile_email.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = DemoConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.session_ttl_hours, 12);
    }

    #[test]
    fn not_configured_without_base_profile() {
        let config = DemoConfig {
            user_email: "demo@example.com".into(),
            user_password: "pw".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }
}
