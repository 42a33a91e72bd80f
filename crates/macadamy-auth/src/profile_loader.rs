use std::sync::Arc;

use macadamy_core::Profile;

use crate::demo::DemoSessionCache;
use crate::error::AuthError;
use crate::ports::ProfileSource;
use crate::store::ProfileStore;

/// Fetches the enriched profile for an identity and installs it in the store.
pub struct ProfileLoader {
    source: Arc<dyn ProfileSource>,
    store: Arc<ProfileStore>,
    demo: Arc<DemoSessionCache>,
}

impl ProfileLoader {
    #[must_use]
    pub fn new(
        source: Arc<dyn ProfileSource>,
        store: Arc<ProfileStore>,
        demo: Arc<DemoSessionCache>,
    ) -> Self {
        Self {
            source,
            store,
            demo,
        }
    }

    /// Fetch the profile for `user_id`, mark it as a demo profile when the
    /// cached demo session belongs to the same user, and install it.
    ///
    /// The store is untouched on error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProfileNotFound` when no profile row exists and any
    /// other `AuthError` the profile source raises.
    pub async fn load(&self, user_id: &str) -> Result<Profile, AuthError> {
        let mut profile = self.source.fetch_profile(user_id).await?;

        if let Some(demo) = self.demo.for_user(user_id) {
            tracing::debug!(user_id, session_id = %demo.session_id, "profile belongs to demo session");
            profile.annotate_demo(demo.session_id);
        }

        self.store.install_profile(profile.clone());
        tracing::debug!(user_id, organization_id = ?profile.organization_id, "profile loaded");
        Ok(profile)
    }
}
