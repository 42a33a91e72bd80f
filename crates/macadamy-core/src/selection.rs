//! Selected-organization validation.
//!
//! The selected organization must always be one the caller is an active
//! member of, or nothing. This module holds the decision logic only; applying
//! the decision to shared state lives in `macadamy-auth`.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of checking a selection against the active membership set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectedOrganizationValidation {
    /// The selection when it is still valid, otherwise `None`.
    pub validated_selected_organization_id: Option<String>,
    /// `true` when a selection exists and is an active membership.
    pub validated_active_membership: bool,
    /// `true` when a selection exists but is no longer an active membership.
    pub should_clear_selection: bool,
}

/// Check `selected` against `active_org_ids`.
#[must_use]
pub fn resolve_selected_organization_validation(
    selected: Option<&str>,
    active_org_ids: &HashSet<String>,
) -> SelectedOrganizationValidation {
    let validated = selected.filter(|id| active_org_ids.contains(*id));

    SelectedOrganizationValidation {
        validated_selected_organization_id: validated.map(str::to_string),
        validated_active_membership: validated.is_some(),
        should_clear_selection: selected.is_some() && validated.is_none(),
    }
}

/// Build the active-id set from raw ids, dropping blank entries.
#[must_use]
pub fn active_org_id_set<I, S>(ids: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .filter(|id| !id.as_ref().trim().is_empty())
        .map(|id| id.as_ref().to_string())
        .collect()
}
