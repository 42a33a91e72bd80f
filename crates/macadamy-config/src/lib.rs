//! # macadamy-config
//!
//! Layered configuration loading for Macadamy using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`MACADAMY_*` prefix, `__` as separator)
//! 2. External overrides passed to [`MacadamyConfig::load_with_env_overrides`]
//! 3. Project-level `.macadamy/config.toml`
//! 4. User-level `~/.config/macadamy/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `MACADAMY_BACKEND__URL` -> `backend.url`,
//! `MACADAMY_DEMO__USER_EMAIL` -> `demo.user_email`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use macadamy_config::MacadamyConfig;
//!
//! let config = MacadamyConfig::load_with_dotenv().expect("config");
//!
//! if config.backend.is_configured() {
//!     println!("Backend URL: {}", config.backend.url);
//! }
//! ```

mod backend;
mod demo;
mod error;
mod session;

pub use backend::BackendConfig;
pub use demo::DemoConfig;
pub use error::ConfigError;
pub use session::SessionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ENV_PREFIX: &str = "MACADAMY_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MacadamyConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl MacadamyConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Load configuration with extra `MACADAMY_*` style key/value pairs (for
    /// example fetched from a secret manager). Process environment variables
    /// still take precedence over these overrides.
    pub fn load_with_env_overrides(overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let mut figment = Self::file_figment();
        for (key, value) in overrides {
            if let Some(path) = env_key_to_path(key) {
                figment = figment.merge(Serialized::default(&path, value));
            }
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        Self::file_figment().merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Defaults plus TOML layers, without the environment.
    fn file_figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".macadamy/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("macadamy").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or current dir looking
    /// for a `.env` file. Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

/// `MACADAMY_BACKEND__ANON_KEY` -> `backend.anon_key`.
fn env_key_to_path(key: &str) -> Option<String> {
    let rest = key.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(
        rest.split("__")
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("."),
    )
}
