use std::sync::Arc;

use macadamy_auth::{CollectingNotifier, SessionContext};
use macadamy_config::MacadamyConfig;

/// Session context plus the notices raised while a command runs.
pub struct CliContext {
    pub session: SessionContext,
    pub notices: Arc<CollectingNotifier>,
}

impl CliContext {
    /// Notice messages raised since the last drain.
    pub fn drain_notices(&self) -> Vec<String> {
        self.notices
            .drain()
            .into_iter()
            .map(|notice| notice.message)
            .collect()
    }
}

/// Build the session context against the configured backend.
pub fn open(config: MacadamyConfig) -> anyhow::Result<CliContext> {
    if !config.backend.is_configured() {
        anyhow::bail!(
            "backend is not configured; set MACADAMY_BACKEND__URL and MACADAMY_BACKEND__ANON_KEY"
        );
    }

    let notices = Arc::new(CollectingNotifier::new());
    let session = SessionContext::from_config(config, notices.clone())?;
    Ok(CliContext { session, notices })
}

pub fn warn_unconfigured(config: &MacadamyConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &MacadamyConfig, vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys: Vec<String> = vars.into_iter().map(|(key, _)| key).collect();
    let mut warnings = Vec::new();

    if !config.backend.is_configured() && has_env_prefix(&env_keys, "MACADAMY_BACKEND") {
        warnings.push(
            "Backend config appears default while MACADAMY_BACKEND* env vars exist. Use double underscores (example: MACADAMY_BACKEND__URL)."
                .to_string(),
        );
    }

    if !config.demo.is_configured() && has_env_prefix(&env_keys, "MACADAMY_DEMO") {
        warnings.push(
            "Demo config is incomplete while MACADAMY_DEMO* env vars exist. Set MACADAMY_DEMO__USER_EMAIL, MACADAMY_DEMO__USER_PASSWORD and MACADAMY_DEMO__BASE_PROFILE_EMAIL."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use macadamy_config::{BackendConfig, DemoConfig, MacadamyConfig};
    use pretty_assertions::assert_eq;

    use super::collect_unconfigured_warnings;

    #[test]
    fn warns_for_unconfigured_sections_with_env_prefixes() {
        let config = MacadamyConfig::default();
        let warnings = collect_unconfigured_warnings(
            &config,
            vec![
                ("MACADAMY_BACKEND_URL".to_string(), "https://x.supabase.co".to_string()),
                ("MACADAMY_DEMO__USER_EMAIL".to_string(), "demo@example.com".to_string()),
            ],
        );

        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn does_not_warn_when_sections_are_configured() {
        let config = MacadamyConfig {
            backend: BackendConfig {
                url: "https://x.supabase.co".to_string(),
                anon_key: "anon".to_string(),
            },
            demo: DemoConfig {
                user_email: "demo@example.com".to_string(),
                user_password: "pw".to_string(),
                base_profile_email: "base@example.com".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let warnings = collect_unconfigured_warnings(
            &config,
            vec![
                ("MACADAMY_BACKEND__URL".to_string(), "https://x.supabase.co".to_string()),
                ("MACADAMY_DEMO__USER_EMAIL".to_string(), "demo@example.com".to_string()),
            ],
        );

        assert!(warnings.is_empty());
    }

    #[test]
    fn ignores_unrelated_env() {
        let warnings = collect_unconfigured_warnings(
            &MacadamyConfig::default(),
            vec![("HOME".to_string(), "/root".to_string())],
        );
        assert!(warnings.is_empty());
    }
}
