//! Password login, demo login and logout.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use macadamy_core::Profile;

use crate::demo::{DemoCloner, DemoSessionCache};
use crate::error::AuthError;
use crate::notice::{Notice, Notifier};
use crate::ports::{AuthProvider, BackendSession};
use crate::profile_loader::ProfileLoader;
use crate::store::ProfileStore;
use crate::token_store::TokenStore;

pub const WELCOME_BACK: &str = "Welcome back!";
pub const WELCOME_TO_DEMO: &str = "Welcome to the Demo Environment!";
pub const LOGGED_OUT: &str = "Logged out successfully";
pub const LOGOUT_FAILED: &str = "Failed to log out. Please try again.";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const TOO_MANY_ATTEMPTS: &str = "Too many failed attempts. Try resetting your password.";
pub const INCORRECT_PASSWORD: &str = "Incorrect password. Please try again.";
pub const PROFILE_MISSING: &str = "Failed to load profile. You may need to complete onboarding.";
pub const DEMO_PROFILE_MISSING: &str =
    "Failed to load demo profile. Please try again later or contact support.";

/// Failed password attempts after which the user is pointed at a reset.
pub const MAX_FAILED_ATTEMPTS: u32 = 3;

/// `local@domain.tld` with no whitespace and a single `@`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    if !clean(local) || !clean(domain) {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Credentials of the shared demo account.
#[derive(Debug, Clone)]
pub struct DemoCredentials {
    pub email: String,
    pub password: String,
}

pub struct SessionManager {
    auth: Arc<dyn AuthProvider>,
    store: Arc<ProfileStore>,
    profiles: Arc<ProfileLoader>,
    demo_cache: Arc<DemoSessionCache>,
    notifier: Arc<dyn Notifier>,
    tokens: Option<TokenStore>,
    demo: Option<(DemoCloner, DemoCredentials)>,
    failed_attempts: AtomicU32,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<ProfileStore>,
        profiles: Arc<ProfileLoader>,
        demo_cache: Arc<DemoSessionCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth,
            store,
            profiles,
            demo_cache,
            notifier,
            tokens: None,
            demo: None,
            failed_attempts: AtomicU32::new(0),
        }
    }

    /// Persist sessions across runs.
    #[must_use]
    pub fn with_token_store(mut self, tokens: TokenStore) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Enable [`Self::login_as_demo_user`].
    #[must_use]
    pub fn with_demo(mut self, cloner: DemoCloner, credentials: DemoCredentials) -> Self {
        self.demo = Some((cloner, credentials));
        self
    }

    #[must_use]
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts.load(Ordering::Relaxed)
    }

    /// Sign in with email and password and load the profile.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidEmail` before any network call for a malformed email.
    /// - `AuthError::InvalidCredentials` when the backend rejects the sign-in.
    /// - `AuthError::ProfileNotFound` when the account has no profile yet.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AuthError> {
        self.store.set_error(None);
        let email = email.trim();

        if !is_valid_email(email) {
            self.report(INVALID_EMAIL);
            return Err(AuthError::InvalidEmail(email.to_string()));
        }

        let session = match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(error) => {
                let attempts = self.failed_attempts.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(attempts, %error, "password sign-in failed");
                let message = if attempts >= MAX_FAILED_ATTEMPTS {
                    TOO_MANY_ATTEMPTS.to_string()
                } else {
                    match &error {
                        AuthError::InvalidCredentials(m) if !m.trim().is_empty() => m.clone(),
                        _ => INCORRECT_PASSWORD.to_string(),
                    }
                };
                self.report(&message);
                return Err(error);
            }
        };

        self.failed_attempts.store(0, Ordering::Relaxed);
        let profile = self.adopt(&session, &session.user.id, PROFILE_MISSING).await?;
        self.notifier.notify(Notice::success(WELCOME_BACK));
        Ok(profile)
    }

    /// Clone (or reuse) demo data, sign in with the demo account and load the
    /// cloned profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DemoConfig` when demo login is not configured and
    /// any `AuthError` raised while cloning, signing in or loading.
    pub async fn login_as_demo_user(&self) -> Result<Profile, AuthError> {
        self.store.set_error(None);
        let Some((cloner, credentials)) = &self.demo else {
            let error = AuthError::DemoConfig("demo login is not configured".into());
            self.report(&error.to_string());
            return Err(error);
        };

        let demo = match cloner.clone_demo_data().await {
            Ok(demo) => demo,
            Err(error) => {
                tracing::error!(%error, "demo clone failed");
                self.report(&error.to_string());
                return Err(error);
            }
        };

        let session = match self
            .auth
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await
        {
            Ok(session) => session,
            Err(error) => {
                tracing::error!(%error, "demo sign-in failed");
                self.report(&error.to_string());
                return Err(error);
            }
        };

        let mut profile = self
            .adopt(&session, &demo.user_id, DEMO_PROFILE_MISSING)
            .await?;
        if !profile.is_demo_user {
            profile.annotate_demo(demo.session_id.clone());
            self.store.set_profile(Some(profile.clone()));
        }

        self.notifier.notify(Notice::success(WELCOME_TO_DEMO));
        Ok(profile)
    }

    /// Sign out remotely and forget all local session state.
    ///
    /// Local state is cleared even when the remote sign-out fails.
    ///
    /// # Errors
    ///
    /// Returns the remote sign-out error, if any.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.set_error(None);
        let remote = self.auth.sign_out().await;

        self.store.clear();
        if let Some(tokens) = &self.tokens
            && let Err(error) = tokens.delete()
        {
            tracing::warn!(%error, "failed to delete stored session");
        }
        if let Err(error) = self.demo_cache.clear() {
            tracing::warn!(%error, "failed to clear demo session");
        }

        match remote {
            Ok(()) => {
                self.notifier.notify(Notice::success(LOGGED_OUT));
                Ok(())
            }
            Err(error) => {
                tracing::error!(%error, "sign-out failed");
                self.store.set_error(Some(error.to_string()));
                self.notifier.notify(Notice::error(LOGOUT_FAILED));
                Err(error)
            }
        }
    }

    async fn adopt(
        &self,
        session: &BackendSession,
        profile_id: &str,
        missing_message: &str,
    ) -> Result<Profile, AuthError> {
        self.store.clear();
        self.store.set_identity(Some(session.user.clone()));

        if let Some(tokens) = &self.tokens
            && let Err(error) = tokens.store(session)
        {
            tracing::warn!(%error, "failed to persist session");
        }

        match self.profiles.load(profile_id).await {
            Ok(profile) => Ok(profile),
            Err(error @ AuthError::ProfileNotFound(_)) => {
                self.report(missing_message);
                Err(error)
            }
            Err(error) => {
                tracing::error!(profile_id, %error, "failed to load profile after sign-in");
                self.report(&error.to_string());
                Err(error)
            }
        }
    }

    fn report(&self, message: &str) {
        self.store.set_error(Some(message.to_string()));
        self.notifier.notify(Notice::error(message));
    }
}
