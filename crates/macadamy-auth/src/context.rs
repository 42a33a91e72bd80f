//! Wiring of the session layer into one explicitly passed context.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use macadamy_config::MacadamyConfig;

use crate::bootstrap::{BootstrapOutcome, SessionBootstrapper};
use crate::demo::{DemoCloner, DemoSessionCache};
use crate::directory::OrganizationDirectory;
use crate::error::AuthError;
use crate::membership::MembershipValidator;
use crate::notice::Notifier;
use crate::ports::{AuthEvent, AuthProvider, AuthStateChange, ProfileSource, RpcClient};
use crate::profile_loader::ProfileLoader;
use crate::rpc::RpcApi;
use crate::session::{DemoCredentials, SessionManager};
use crate::storage::{FileKeyValueStore, KeyValueStore};
use crate::store::ProfileStore;
use crate::supabase::SupabaseClient;
use crate::switcher::PrimaryOrganizationSwitcher;
use crate::token_store::{TokenSource, TokenStore};

/// Backend collaborators the context is built from.
pub struct Backend {
    pub auth: Arc<dyn AuthProvider>,
    pub rpc: Arc<dyn RpcClient>,
    pub profiles: Arc<dyn ProfileSource>,
}

pub struct SessionContext {
    pub config: MacadamyConfig,
    pub auth: Arc<dyn AuthProvider>,
    pub rpc: RpcApi,
    pub store: Arc<ProfileStore>,
    pub demo_cache: Arc<DemoSessionCache>,
    pub profiles: Arc<ProfileLoader>,
    pub directory: Arc<OrganizationDirectory>,
    pub bootstrapper: Arc<SessionBootstrapper>,
    pub validator: MembershipValidator,
    pub switcher: Arc<PrimaryOrganizationSwitcher>,
    pub sessions: SessionManager,
    tokens: Option<TokenStore>,
}

impl SessionContext {
    /// Build against the configured Supabase project, resuming any session
    /// persisted by an earlier run.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the backend is not configured or no storage
    /// directory can be resolved.
    pub fn from_config(config: MacadamyConfig, notifier: Arc<dyn Notifier>) -> Result<Self, AuthError> {
        let storage_dir = config.session.storage_path().ok_or_else(|| {
            AuthError::Storage("home directory not found; set MACADAMY_SESSION__STORAGE_DIR".into())
        })?;
        let tokens = TokenStore::new(&storage_dir);
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::in_dir(&storage_dir));

        let client = Arc::new(SupabaseClient::from_config(&config.backend)?);
        client.restore_session(tokens.load());

        let backend = Backend {
            auth: client.clone(),
            rpc: client.clone(),
            profiles: client,
        };
        Ok(Self::with_backend(config, backend, storage, notifier, Some(tokens)))
    }

    /// Build from explicit collaborators.
    #[must_use]
    pub fn with_backend(
        config: MacadamyConfig,
        backend: Backend,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        tokens: Option<TokenStore>,
    ) -> Self {
        let store = Arc::new(ProfileStore::new());
        let rpc = RpcApi::new(backend.rpc);
        let demo_cache = Arc::new(DemoSessionCache::with_ttl(
            storage,
            TimeDelta::hours(i64::from(config.demo.session_ttl_hours)),
        ));
        let profiles = Arc::new(ProfileLoader::new(
            backend.profiles,
            store.clone(),
            demo_cache.clone(),
        ));
        let directory = Arc::new(OrganizationDirectory::with_ttl(
            rpc.clone(),
            Duration::from_secs(config.session.org_cache_ttl_secs),
        ));

        let timeout = match config.session.switch_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let switcher = Arc::new(
            PrimaryOrganizationSwitcher::new(
                rpc.clone(),
                store.clone(),
                profiles.clone(),
                notifier.clone(),
            )
            .with_timeout(timeout)
            .with_directory(directory.clone()),
        );

        let bootstrapper = Arc::new(SessionBootstrapper::new(
            backend.auth.clone(),
            store.clone(),
            profiles.clone(),
        ));
        let validator = MembershipValidator::new(rpc.clone(), store.clone());

        let mut sessions = SessionManager::new(
            backend.auth.clone(),
            store.clone(),
            profiles.clone(),
            demo_cache.clone(),
            notifier,
        );
        if let Some(tokens) = &tokens {
            sessions = sessions.with_token_store(tokens.clone());
        }
        if config.demo.is_configured() {
            let cloner = DemoCloner::new(
                rpc.clone(),
                demo_cache.clone(),
                config.demo.base_profile_email.clone(),
            );
            sessions = sessions.with_demo(
                cloner,
                DemoCredentials {
                    email: config.demo.user_email.clone(),
                    password: config.demo.user_password.clone(),
                },
            );
        }

        Self {
            config,
            auth: backend.auth,
            rpc,
            store,
            demo_cache,
            profiles,
            directory,
            bootstrapper,
            validator,
            switcher,
            sessions,
            tokens,
        }
    }

    /// Run the startup bootstrap, persisting any session change it caused
    /// (for example a token refresh).
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        let mut events = self.auth.subscribe();
        let outcome = self.bootstrapper.bootstrap().await;
        while let Ok(change) = events.try_recv() {
            self.persist(&change);
        }
        outcome
    }

    /// Where the persisted session would be loaded from, if any.
    #[must_use]
    pub fn token_source(&self) -> Option<TokenSource> {
        self.tokens
            .as_ref()
            .and_then(TokenStore::load_with_source)
            .map(|(_, source)| source)
    }

    fn persist(&self, change: &AuthStateChange) {
        let Some(tokens) = &self.tokens else {
            return;
        };
        let result = match (change.event, &change.session) {
            (AuthEvent::SignedOut, _) => tokens.delete(),
            (_, Some(session)) => tokens.store(session),
            (_, None) => Ok(()),
        };
        if let Err(error) = result {
            tracing::warn!(event = ?change.event, %error, "failed to persist session change");
        }
    }
}
