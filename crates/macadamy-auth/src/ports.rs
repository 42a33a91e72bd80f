//! Collaborator ports.
//!
//! The session layer never talks to the hosted backend directly. It sees the
//! auth service, the remote-procedure endpoint and the profile table through
//! these traits; [`crate::supabase::SupabaseClient`] implements all three over
//! HTTP and tests plug in in-process fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use macadamy_core::{Identity, Profile};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::AuthError;

/// Authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Identity,
}

/// Auth lifecycle events published by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// One auth-state-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStateChange {
    pub event: AuthEvent,
    pub session: Option<BackendSession>,
}

impl AuthStateChange {
    #[must_use]
    pub fn user(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Auth collaborator: session lookup, password sign-in, sign-out, events.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, `Ok(None)` when nobody is signed in.
    async fn get_session(&self) -> Result<Option<BackendSession>, AuthError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BackendSession, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribe to auth-state changes made after this call.
    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;
}

/// Remote procedure collaborator.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Invoke `function` with named JSON arguments and return the raw result.
    async fn call(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError>;
}

/// Profile-fetch collaborator.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Enriched profile (joined organization, job title, avatar) for `user_id`.
    ///
    /// Returns [`AuthError::ProfileNotFound`] when no profile row exists.
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, AuthError>;
}
