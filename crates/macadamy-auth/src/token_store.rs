use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AuthError;
use crate::ports::BackendSession;

const DEFAULT_KEYRING_SERVICE: &str = "macadamy-cli";
const KEYRING_USER: &str = "backend-session";
const CREDENTIALS_FILE_NAME: &str = "credentials.json";
const SESSION_ENV_VAR: &str = "MACADAMY_AUTH__SESSION";

/// Where a loaded session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    Keyring,
    Env,
    File,
}

/// Persists the backend session between CLI runs.
///
/// Load priority: keyring → `MACADAMY_AUTH__SESSION` env → credentials file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    service: String,
    credentials_path: PathBuf,
    use_keyring: bool,
}

impl TokenStore {
    /// Store backed by the OS keyring, with `<dir>/credentials.json` as
    /// fallback.
    ///
    /// The keyring service defaults to `"macadamy-cli"`. Override via
    /// `MACADAMY_KEYRING_SERVICE` to keep test runs away from real credentials.
    #[must_use]
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            service: std::env::var("MACADAMY_KEYRING_SERVICE")
                .unwrap_or_else(|_| DEFAULT_KEYRING_SERVICE.to_string()),
            credentials_path: storage_dir.join(CREDENTIALS_FILE_NAME),
            use_keyring: true,
        }
    }

    /// Store that never touches the keyring.
    #[must_use]
    pub fn file_only(storage_dir: &Path) -> Self {
        Self {
            use_keyring: false,
            ..Self::new(storage_dir)
        }
    }

    #[must_use]
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    fn entry(&self) -> Option<keyring::Entry> {
        if !self.use_keyring {
            return None;
        }
        keyring::Entry::new(&self.service, KEYRING_USER).ok()
    }

    /// Persist `session`. Falls back to the credentials file if the keyring
    /// is unavailable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if both keyring and file storage fail.
    pub fn store(&self, session: &BackendSession) -> Result<(), AuthError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| AuthError::TokenStoreError(format!("encode session: {e}")))?;

        match self.entry() {
            Some(entry) => match entry.set_password(&raw) {
                Ok(()) => Ok(()),
                Err(error) => {
                    tracing::warn!(%error, "keyring store failed; falling back to file");
                    self.store_file(&raw)
                }
            },
            None => self.store_file(&raw),
        }
    }

    /// Load the persisted session, if any.
    #[must_use]
    pub fn load(&self) -> Option<BackendSession> {
        self.load_with_source().map(|(session, _)| session)
    }

    /// Like [`Self::load`], also reporting which tier answered.
    #[must_use]
    pub fn load_with_source(&self) -> Option<(BackendSession, TokenSource)> {
        if let Some(entry) = self.entry()
            && let Ok(raw) = entry.get_password()
            && let Some(session) = parse(&raw)
        {
            return Some((session, TokenSource::Keyring));
        }

        if let Ok(raw) = std::env::var(SESSION_ENV_VAR)
            && let Some(session) = parse(&raw)
        {
            return Some((session, TokenSource::Env));
        }

        self.load_file().map(|session| (session, TokenSource::File))
    }

    /// Delete the session from keyring and file.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the credentials file cannot be removed.
    pub fn delete(&self) -> Result<(), AuthError> {
        if let Some(entry) = self.entry() {
            // Missing entries are fine.
            let _ = entry.delete_credential();
        }

        if self.credentials_path.exists() {
            fs::remove_file(&self.credentials_path).map_err(|e| {
                AuthError::TokenStoreError(format!(
                    "failed to delete {}: {e}",
                    self.credentials_path.display()
                ))
            })?;
        }
        Ok(())
    }

    fn store_file(&self, raw: &str) -> Result<(), AuthError> {
        let path = &self.credentials_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::TokenStoreError(format!("mkdir {}: {e}", parent.display()))
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
        fs::write(path, raw)
            .map_err(|e| AuthError::TokenStoreError(format!("write {}: {e}", path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::TokenStoreError(format!("chmod {}: {e}", path.display()))
            })?;
        }

        Ok(())
    }

    fn load_file(&self) -> Option<BackendSession> {
        let raw = fs::read_to_string(&self.credentials_path).ok()?;
        parse(&raw)
    }
}

fn parse(raw: &str) -> Option<BackendSession> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(session) => Some(session),
        Err(error) => {
            tracing::warn!(%error, "ignoring unreadable stored session");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use macadamy_core::Identity;

    use super::*;

    fn session() -> BackendSession {
        BackendSession {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: None,
            user: Identity::new("user-1").with_email("a@b.co"),
        }
    }

    #[test]
    fn file_store_load_delete_cycle() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = TokenStore::file_only(&tmp.path().join("state"));

        store.store(&session()).expect("store");
        assert_eq!(store.load(), Some(session()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.credentials_path())
                .expect("metadata")
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, 0o600, "credentials file should be 0600");
        }

        store.delete().expect("delete");
        assert!(!store.credentials_path().exists());
    }

    #[test]
    fn whitespace_only_file_is_ignored() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = TokenStore::file_only(tmp.path());
        std::fs::write(store.credentials_path(), "   \n  ").expect("write");

        assert!(store.load_file().is_none());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = TokenStore::file_only(tmp.path());
        std::fs::write(store.credentials_path(), "{\"access_token\":").expect("write");

        assert!(store.load_file().is_none());
    }

    #[test]
    fn delete_without_file_is_ok() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        TokenStore::file_only(tmp.path()).delete().expect("delete");
    }
}
