//! Single-flight primary-organization switching.
//!
//! A switch moves through `Idle → InFlight → outcome → Idle`. Only one switch
//! runs at a time; a request arriving while another is in flight is refused
//! with [`SwitchOutcome::Busy`] and never reaches the backend. The in-flight
//! flag is taken before the first suspension point and released by
//! [`SwitchGuard`]'s `Drop`, so every exit path (including a dropped future)
//! returns the switcher to idle.
//!
//! The store selection changes only after the backend has accepted the new
//! primary organization. Every slow-path invocation emits exactly one notice.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::directory::OrganizationDirectory;
use crate::error::AuthError;
use crate::notice::{
    NO_LONGER_A_MEMBER, Notice, Notifier, PRIMARY_ORGANIZATION_UPDATED, backend_failure_message,
};
use crate::profile_loader::ProfileLoader;
use crate::rpc::{GET_MY_MEMBER_ORGANIZATIONS, RpcApi, SET_MY_PRIMARY_ORGANIZATION};
use crate::store::ProfileStore;

pub const SWITCH_MODULE: &str = "PrimaryOrganizationSwitch";
pub const SWITCH_OPERATION: &str = "switch primary organization";

/// Terminal state of one switch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// Another switch was in flight; nothing happened.
    Busy,
    /// Requested organization already primary; selection set locally.
    FastPathDone,
    /// Caller is not an active member of the requested organization.
    MembershipRejected,
    /// Backend accepted the change and the selection was updated.
    Persisted { profile_reloaded: bool },
    /// Any other failure, with the message shown to the user.
    Failed { message: String },
}

impl SwitchOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self, Self::FastPathDone | Self::Persisted { .. })
    }
}

/// Held while a switch is in flight.
struct SwitchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SwitchGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

enum SwitchFailure {
    NotMember,
    Backend(AuthError),
}

impl From<AuthError> for SwitchFailure {
    fn from(error: AuthError) -> Self {
        if error.is_not_member() {
            Self::NotMember
        } else {
            Self::Backend(error)
        }
    }
}

pub struct PrimaryOrganizationSwitcher {
    rpc: RpcApi,
    store: Arc<ProfileStore>,
    profiles: Arc<ProfileLoader>,
    directory: Option<Arc<OrganizationDirectory>>,
    notifier: Arc<dyn Notifier>,
    timeout: Option<Duration>,
    in_flight: AtomicBool,
}

impl PrimaryOrganizationSwitcher {
    #[must_use]
    pub fn new(
        rpc: RpcApi,
        store: Arc<ProfileStore>,
        profiles: Arc<ProfileLoader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            rpc,
            store,
            profiles,
            directory: None,
            notifier,
            timeout: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Bound each remote call. `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory whose cache is dropped after a successful switch.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<OrganizationDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    #[must_use]
    pub fn is_switching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Switch and report only whether the organization is now primary.
    pub async fn switch_primary_organization(&self, organization_id: &str) -> bool {
        self.switch_with_outcome(organization_id).await.succeeded()
    }

    pub async fn switch_with_outcome(&self, organization_id: &str) -> SwitchOutcome {
        let Some(_guard) = SwitchGuard::try_acquire(&self.in_flight) else {
            tracing::debug!(organization_id, "switch already in flight; ignoring request");
            return SwitchOutcome::Busy;
        };

        let current = self.store.profile().and_then(|p| p.organization_id);
        if current.as_deref() == Some(organization_id) {
            self.store
                .set_selected_organization_id(Some(organization_id.to_string()));
            tracing::debug!(organization_id, "organization already primary");
            return SwitchOutcome::FastPathDone;
        }

        let user_id = self.store.identity().map(|i| i.id);
        match self.persist(organization_id, user_id.as_deref()).await {
            Ok(profile_reloaded) => {
                self.notifier
                    .notify(Notice::success(PRIMARY_ORGANIZATION_UPDATED));
                SwitchOutcome::Persisted { profile_reloaded }
            }
            Err(SwitchFailure::NotMember) => {
                tracing::warn!(
                    module = SWITCH_MODULE,
                    organization_id,
                    user_id = ?user_id,
                    "caller is not a member of the requested organization"
                );
                self.notifier.notify(Notice::error(NO_LONGER_A_MEMBER));
                SwitchOutcome::MembershipRejected
            }
            Err(SwitchFailure::Backend(error)) => {
                tracing::error!(
                    module = SWITCH_MODULE,
                    operation = SWITCH_OPERATION,
                    trigger = "user",
                    organization_id,
                    user_id = ?user_id,
                    %error,
                    "[{SWITCH_MODULE}] {SWITCH_OPERATION} failed"
                );
                let message = backend_failure_message(SWITCH_MODULE, SWITCH_OPERATION, &error);
                self.notifier.notify(Notice::error(message.clone()));
                SwitchOutcome::Failed { message }
            }
        }
    }

    /// Returns whether the profile was reloaded afterwards.
    async fn persist(
        &self,
        organization_id: &str,
        user_id: Option<&str>,
    ) -> Result<bool, SwitchFailure> {
        let member_ids = self
            .bounded(
                GET_MY_MEMBER_ORGANIZATIONS,
                self.rpc.get_my_member_organization_ids(),
            )
            .await?;
        if !member_ids.contains(organization_id) {
            return Err(SwitchFailure::NotMember);
        }

        self.bounded(
            SET_MY_PRIMARY_ORGANIZATION,
            self.rpc.set_my_primary_organization(organization_id),
        )
        .await?;
        self.store
            .set_selected_organization_id(Some(organization_id.to_string()));
        tracing::info!(organization_id, "primary organization updated");

        let Some(user_id) = user_id else {
            return Ok(false);
        };
        if let Some(directory) = &self.directory {
            directory.invalidate(user_id);
        }

        // The change is already persisted; a failed reload only leaves the
        // cached profile stale.
        match self.bounded("load profile", self.profiles.load(user_id)).await {
            Ok(_) => Ok(true),
            Err(error) => {
                tracing::warn!(user_id, %error, "profile reload after switch failed");
                Ok(false)
            }
        }
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        let Some(limit) = self.timeout else {
            return call.await;
        };
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AuthError::Timeout {
                operation: operation.to_string(),
                after_ms: limit.as_millis(),
            })?
    }
}
