//! Keeps the selected organization consistent with server-side membership.

use std::collections::HashSet;
use std::sync::Arc;

use macadamy_core::SelectedOrganizationValidation;
use macadamy_core::resolve_selected_organization_validation;

use crate::error::AuthError;
use crate::rpc::RpcApi;
use crate::store::ProfileStore;

/// Validate the store's selection against `active_org_ids` and clear it when
/// the membership has lapsed.
pub fn reconcile_selected_organization(
    store: &ProfileStore,
    active_org_ids: &HashSet<String>,
) -> SelectedOrganizationValidation {
    let selected = store.selected_organization_id();
    let validation = resolve_selected_organization_validation(selected.as_deref(), active_org_ids);

    if validation.should_clear_selection
        && let Some(stale) = selected.as_deref()
        && store.clear_selection_if(stale)
    {
        tracing::info!(organization_id = stale, "cleared selection for lapsed membership");
    }

    validation
}

/// Fetches the current membership listing and reconciles the store with it.
pub struct MembershipValidator {
    rpc: RpcApi,
    store: Arc<ProfileStore>,
}

impl MembershipValidator {
    #[must_use]
    pub fn new(rpc: RpcApi, store: Arc<ProfileStore>) -> Self {
        Self { rpc, store }
    }

    /// Ids of the caller's active memberships. Rows without an id are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the listing call fails.
    pub async fn active_organization_ids(&self) -> Result<HashSet<String>, AuthError> {
        self.rpc.get_my_member_organization_ids().await
    }

    /// Re-check the selection against a fresh listing.
    ///
    /// On a failed listing the selection is left as is.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the listing call fails.
    pub async fn validate(&self) -> Result<SelectedOrganizationValidation, AuthError> {
        let active = self.active_organization_ids().await?;
        Ok(reconcile_selected_organization(&self.store, &active))
    }
}
