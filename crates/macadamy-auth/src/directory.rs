//! Cached listings of the caller's organization memberships.
//!
//! Listings are cached per profile id for a short TTL. Rows that fail
//! validation are skipped with a warning instead of failing the listing.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use macadamy_core::{InactiveMembership, MemberOrganization};
use serde::Serialize;

use crate::error::AuthError;
use crate::rpc::{RowResult, RpcApi};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// An active membership ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationItem {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub role_label: Option<String>,
}

impl From<MemberOrganization> for OrganizationItem {
    fn from(org: MemberOrganization) -> Self {
        let role_label = org.role_label();
        let role = org.effective_permission_role().map(str::to_string);
        Self {
            id: org.id,
            name: org.name,
            role,
            role_label,
        }
    }
}

struct CacheEntry<T> {
    items: Vec<T>,
    fetched_at: Instant,
}

type Cache<T> = Mutex<HashMap<String, CacheEntry<T>>>;

pub struct OrganizationDirectory {
    rpc: RpcApi,
    ttl: Duration,
    active: Cache<OrganizationItem>,
    inactive: Cache<InactiveMembership>,
}

impl OrganizationDirectory {
    #[must_use]
    pub fn new(rpc: RpcApi) -> Self {
        Self::with_ttl(rpc, DEFAULT_CACHE_TTL)
    }

    #[must_use]
    pub fn with_ttl(rpc: RpcApi, ttl: Duration) -> Self {
        Self {
            rpc,
            ttl,
            active: Mutex::new(HashMap::new()),
            inactive: Mutex::new(HashMap::new()),
        }
    }

    /// Active memberships of `profile_id`'s caller. Empty listings are not
    /// cached so a freshly granted membership shows up on the next call.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the listing call fails.
    pub async fn list(&self, profile_id: &str) -> Result<Vec<OrganizationItem>, AuthError> {
        if let Some(items) = self.cached(&self.active, profile_id) {
            tracing::debug!(profile_id, count = items.len(), "organization listing from cache");
            return Ok(items);
        }

        let rows = self.rpc.get_my_member_organizations().await?;
        let items: Vec<OrganizationItem> = keep_valid(rows, "member organization")
            .into_iter()
            .map(OrganizationItem::from)
            .collect();

        if !items.is_empty() {
            self.remember(&self.active, profile_id, items.clone());
        }
        Ok(items)
    }

    /// Memberships the caller used to hold, most recent listing order kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the listing call fails.
    pub async fn list_inactive(
        &self,
        profile_id: &str,
    ) -> Result<Vec<InactiveMembership>, AuthError> {
        if let Some(items) = self.cached(&self.inactive, profile_id) {
            return Ok(items);
        }

        let rows = self.rpc.get_my_inactive_member_organizations().await?;
        let items = keep_valid(rows, "inactive membership");
        self.remember(&self.inactive, profile_id, items.clone());
        Ok(items)
    }

    /// Drop cached listings for one profile.
    pub fn invalidate(&self, profile_id: &str) {
        lock(&self.active).remove(profile_id);
        lock(&self.inactive).remove(profile_id);
    }

    pub fn invalidate_all(&self) {
        lock(&self.active).clear();
        lock(&self.inactive).clear();
    }

    fn cached<T: Clone>(&self, cache: &Cache<T>, profile_id: &str) -> Option<Vec<T>> {
        let mut entries = lock(cache);
        let fresh = entries
            .get(profile_id)
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.ttl);
        if fresh {
            entries.get(profile_id).map(|entry| entry.items.clone())
        } else {
            entries.remove(profile_id);
            None
        }
    }

    fn remember<T>(&self, cache: &Cache<T>, profile_id: &str, items: Vec<T>) {
        lock(cache).insert(
            profile_id.to_string(),
            CacheEntry {
                items,
                fetched_at: Instant::now(),
            },
        );
    }
}

fn lock<T>(cache: &Cache<T>) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

fn keep_valid<T>(rows: Vec<RowResult<T>>, what: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(item) => Some(item),
            Err(error) => {
                tracing::warn!(%error, "skipping invalid {what} row");
                None
            }
        })
        .collect()
}
