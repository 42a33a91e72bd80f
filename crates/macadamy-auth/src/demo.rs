//! Demo sessions: local TTL cache plus the clone-on-first-login flow.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use macadamy_core::DemoSession;
use macadamy_core::demo::{DEFAULT_DEMO_SESSION_TTL, DEMO_SESSION_STORAGE_KEY};

use crate::error::AuthError;
use crate::rpc::RpcApi;
use crate::storage::KeyValueStore;

/// Reads and writes the cached [`DemoSession`] under `demo_session`.
pub struct DemoSessionCache {
    storage: Arc<dyn KeyValueStore>,
    ttl: TimeDelta,
}

impl DemoSessionCache {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(storage, DEFAULT_DEMO_SESSION_TTL)
    }

    #[must_use]
    pub fn with_ttl(storage: Arc<dyn KeyValueStore>, ttl: TimeDelta) -> Self {
        Self { storage, ttl }
    }

    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Unexpired cached session, if any.
    #[must_use]
    pub fn get(&self) -> Option<DemoSession> {
        self.get_at(Utc::now())
    }

    /// Like [`Self::get`] with an explicit clock. Expired or unreadable
    /// entries are removed and reported as absent.
    #[must_use]
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<DemoSession> {
        let raw = match self.storage.get(DEMO_SESSION_STORAGE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(error) => {
                tracing::warn!(%error, "failed to read cached demo session");
                return None;
            }
        };

        let session = match serde_json::from_str::<DemoSession>(&raw) {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable demo session");
                self.remove_quietly();
                return None;
            }
        };

        if session.is_expired_at(now, self.ttl) {
            tracing::debug!(session_id = %session.session_id, "demo session expired");
            self.remove_quietly();
            return None;
        }

        Some(session)
    }

    /// Cached session for `user_id`, if one exists and is unexpired.
    #[must_use]
    pub fn for_user(&self, user_id: &str) -> Option<DemoSession> {
        self.get().filter(|s| s.belongs_to(user_id))
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the record cannot be written.
    pub fn save(&self, session: &DemoSession) -> Result<(), AuthError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| AuthError::Storage(format!("encode demo session: {e}")))?;
        self.storage.set(DEMO_SESSION_STORAGE_KEY, &raw)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the record cannot be removed.
    pub fn clear(&self) -> Result<(), AuthError> {
        self.storage.remove(DEMO_SESSION_STORAGE_KEY)
    }

    fn remove_quietly(&self) {
        if let Err(error) = self.clear() {
            tracing::warn!(%error, "failed to remove cached demo session");
        }
    }
}

/// Creates demo clones, reusing a cached one while it is fresh.
pub struct DemoCloner {
    rpc: RpcApi,
    cache: Arc<DemoSessionCache>,
    base_profile_email: String,
}

impl DemoCloner {
    #[must_use]
    pub fn new(rpc: RpcApi, cache: Arc<DemoSessionCache>, base_profile_email: impl Into<String>) -> Self {
        Self {
            rpc,
            cache,
            base_profile_email: base_profile_email.into(),
        }
    }

    /// Return the cached demo session or clone a fresh environment.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DemoConfig` without a base profile email, and
    /// `AuthError` from either clone step.
    pub async fn clone_demo_data(&self) -> Result<DemoSession, AuthError> {
        if let Some(cached) = self.cache.get() {
            tracing::debug!(session_id = %cached.session_id, "reusing cached demo session");
            return Ok(cached);
        }

        if self.base_profile_email.trim().is_empty() {
            tracing::error!("demo base profile email is not configured");
            return Err(AuthError::DemoConfig(
                "MACADAMY_DEMO__BASE_PROFILE_EMAIL is not set".into(),
            ));
        }

        let created = self
            .rpc
            .create_demo_environment(&self.base_profile_email)
            .await?;
        self.rpc.execute_full_demo_clone(&created.session_id).await?;

        let session = DemoSession::new(created.session_id, created.profile_id, Utc::now());
        self.cache.save(&session)?;
        tracing::info!(session_id = %session.session_id, user_id = %session.user_id, "demo environment cloned");
        Ok(session)
    }
}
