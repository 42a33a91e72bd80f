//! Shared identity / profile / selected-organization state.
//!
//! One [`ProfileStore`] exists per application context and is handed to every
//! component that reads or mutates session state (`Arc<ProfileStore>`). Writes
//! go through a single lock that is never held across an `.await`.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use macadamy_core::{Identity, Profile};
use serde::Serialize;

/// Point-in-time copy of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub selected_organization_id: Option<String>,
    /// `true` while the initial session check is running.
    pub initializing: bool,
    /// Last auth error recorded by bootstrap or sign-in.
    pub last_error: Option<String>,
}

impl StoreSnapshot {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Organization id on the loaded profile, if any.
    #[must_use]
    pub fn profile_organization_id(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.organization_id.as_deref())
    }
}

#[derive(Debug, Default)]
pub struct ProfileStore {
    state: RwLock<StoreSnapshot>,
}

impl ProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.read().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.read().profile.clone()
    }

    #[must_use]
    pub fn selected_organization_id(&self) -> Option<String> {
        self.read().selected_organization_id.clone()
    }

    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.read().initializing
    }

    /// Set the signed-in identity. Clearing it also clears the profile and
    /// the selection in the same write.
    pub fn set_identity(&self, identity: Option<Identity>) {
        let mut state = self.write();
        if identity.is_none() {
            state.profile = None;
            state.selected_organization_id = None;
        }
        state.identity = identity;
    }

    pub fn set_profile(&self, profile: Option<Profile>) {
        self.write().profile = profile;
    }

    pub fn set_selected_organization_id(&self, organization_id: Option<String>) {
        self.write().selected_organization_id = organization_id;
    }

    /// Clear the selection only if it still equals `organization_id`.
    /// Returns whether anything was cleared.
    pub fn clear_selection_if(&self, organization_id: &str) -> bool {
        let mut state = self.write();
        if state.selected_organization_id.as_deref() == Some(organization_id) {
            state.selected_organization_id = None;
            true
        } else {
            false
        }
    }

    /// Install a freshly loaded profile. When nothing is selected yet, the
    /// profile's primary organization becomes the selection.
    pub fn install_profile(&self, profile: Profile) {
        let mut state = self.write();
        if state.selected_organization_id.is_none() {
            state
                .selected_organization_id
                .clone_from(&profile.organization_id);
        }
        state.profile = Some(profile);
    }

    /// Reset identity, profile and selection.
    pub fn clear(&self) {
        let mut state = self.write();
        state.identity = None;
        state.profile = None;
        state.selected_organization_id = None;
    }

    pub fn set_initializing(&self, initializing: bool) {
        self.write().initializing = initializing;
    }

    pub fn set_error(&self, error: Option<String>) {
        self.write().last_error = error;
    }
}
