//! Startup session resolution and auth-state-change handling.

use std::sync::Arc;

use macadamy_core::{Identity, Profile};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::AuthError;
use crate::ports::{AuthEvent, AuthProvider, AuthStateChange};
use crate::profile_loader::ProfileLoader;
use crate::store::ProfileStore;

/// Where a bootstrap or auth event left the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// Nobody is signed in.
    Anonymous,
    Authenticated { identity: Identity, profile: Profile },
    /// Signed in but no profile row exists yet.
    NeedsOnboarding { identity: Identity },
    /// Recovery link followed; the password must be updated next.
    PasswordRecovery { identity: Option<Identity> },
    Failed { error: String },
}

impl BootstrapOutcome {
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated { identity, .. } | Self::NeedsOnboarding { identity } => {
                Some(identity)
            }
            Self::PasswordRecovery { identity } => identity.as_ref(),
            Self::Anonymous | Self::Failed { .. } => None,
        }
    }
}

/// Keeps the store's initializing flag raised for its lifetime.
struct Initializing<'a> {
    store: &'a ProfileStore,
}

impl<'a> Initializing<'a> {
    fn begin(store: &'a ProfileStore) -> Self {
        store.set_initializing(true);
        Self { store }
    }
}

impl Drop for Initializing<'_> {
    fn drop(&mut self) {
        self.store.set_initializing(false);
    }
}

pub struct SessionBootstrapper {
    auth: Arc<dyn AuthProvider>,
    store: Arc<ProfileStore>,
    profiles: Arc<ProfileLoader>,
}

impl SessionBootstrapper {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<ProfileStore>,
        profiles: Arc<ProfileLoader>,
    ) -> Self {
        Self {
            auth,
            store,
            profiles,
        }
    }

    /// Resolve the current session once and populate the store.
    ///
    /// Never retries. The initializing flag is lowered on every exit path.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        let _initializing = Initializing::begin(&self.store);
        self.store.set_error(None);
        tracing::debug!("starting session bootstrap");

        let outcome = match self.auth.get_session().await {
            Err(error) => {
                tracing::error!(%error, "session lookup failed");
                self.fail(&error)
            }
            Ok(None) => {
                self.store.clear();
                BootstrapOutcome::Anonymous
            }
            Ok(Some(session)) => self.adopt(session.user).await,
        };

        tracing::debug!(?outcome, "session bootstrap complete");
        outcome
    }

    /// Apply one auth-state change published after bootstrap.
    pub async fn handle_auth_event(&self, change: AuthStateChange) -> BootstrapOutcome {
        tracing::debug!(event = ?change.event, "auth state change");
        let user = change.user().cloned();

        if change.event == AuthEvent::PasswordRecovery {
            self.set_identity(user.clone());
            self.store.set_initializing(false);
            return BootstrapOutcome::PasswordRecovery { identity: user };
        }

        let outcome = match user {
            Some(identity) => self.adopt(identity).await,
            None => {
                self.store.clear();
                BootstrapOutcome::Anonymous
            }
        };
        self.store.set_initializing(false);
        outcome
    }

    /// Apply auth-state changes until the provider's channel closes.
    ///
    /// Subscribe before calling [`Self::bootstrap`] so no change is missed.
    /// If the listener falls behind it re-resolves the session from scratch.
    #[must_use]
    pub fn spawn_listener(
        self: Arc<Self>,
        mut events: broadcast::Receiver<AuthStateChange>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(change) => {
                        self.handle_auth_event(change).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth listener lagged; re-resolving session");
                        self.bootstrap().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("auth listener stopped");
        })
    }

    fn set_identity(&self, identity: Option<Identity>) {
        // A different user must not inherit the previous selection.
        let changed = self.store.identity().map(|i| i.id) != identity.as_ref().map(|i| i.id.clone());
        if changed {
            self.store.clear();
        }
        self.store.set_identity(identity);
    }

    async fn adopt(&self, identity: Identity) -> BootstrapOutcome {
        self.set_identity(Some(identity.clone()));

        match self.profiles.load(&identity.id).await {
            Ok(profile) => BootstrapOutcome::Authenticated { identity, profile },
            Err(AuthError::ProfileNotFound(_)) => {
                tracing::info!(user_id = %identity.id, "signed in without a profile; onboarding required");
                self.store.set_profile(None);
                BootstrapOutcome::NeedsOnboarding { identity }
            }
            Err(error) => {
                tracing::error!(user_id = %identity.id, %error, "failed to load profile");
                self.fail(&error)
            }
        }
    }

    fn fail(&self, error: &AuthError) -> BootstrapOutcome {
        self.store.set_error(Some(error.to_string()));
        self.store.clear();
        BootstrapOutcome::Failed {
            error: error.to_string(),
        }
    }
}
