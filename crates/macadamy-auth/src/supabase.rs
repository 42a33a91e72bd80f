//! HTTP adapter for a Supabase backend.
//!
//! Talks to GoTrue (`/auth/v1`) for sessions and PostgREST (`/rest/v1`) for
//! remote procedures and the `profiles` table. Every request carries the
//! project's anon key as `apikey`; authenticated requests add the session's
//! access token as bearer, anonymous ones fall back to the anon key.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use macadamy_config::BackendConfig;
use macadamy_core::profile::ProfileRow;
use macadamy_core::{Identity, Profile};
use serde::Deserialize;
use tokio::sync::broadcast;
use url::Url;

use crate::error::{AuthError, RpcError};
use crate::ports::{
    AuthEvent, AuthProvider, AuthStateChange, BackendSession, ProfileSource, RpcClient,
};
use crate::refresh::is_near_expiry;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Columns and embedded relations of an enriched profile.
pub const PROFILE_SELECT: &str = "id,role,full_name,email,username,phone,location,\
avatar_id,organization_id,job_title_id,session_id,\
organizations(id,name,address,phone,website),\
job_titles(id,title,is_custom),\
avatars(url)";

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    email: Option<String>,
}

impl UserRecord {
    fn into_identity(self) -> Identity {
        let mut user = Identity::new(self.id);
        user.email = self.email.filter(|e| !e.is_empty());
        user
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: UserRecord,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> BackendSession {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl))
            });
        BackendSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at,
            user: self.user.into_identity(),
        }
    }
}

/// GoTrue error bodies vary by version; take whichever message is present.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueError {
    fn parse(body: &str) -> Option<String> {
        let parsed: Self = serde_json::from_str(body).ok()?;
        parsed
            .error_description
            .or(parsed.msg)
            .or(parsed.message)
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
    }
}

fn rpc_error_from_body(status: reqwest::StatusCode, body: &str) -> RpcError {
    serde_json::from_str::<RpcError>(body)
        .ok()
        .filter(|e| !e.message.is_empty() || e.code.is_some())
        .unwrap_or_else(|| RpcError {
            code: None,
            message: format!("HTTP {status}: {body}"),
            details: None,
            hint: None,
        })
}

pub struct SupabaseClient {
    http: reqwest::Client,
    base: String,
    anon_key: String,
    session: RwLock<Option<BackendSession>>,
    /// Set once the held session has been issued or confirmed by the server.
    verified: AtomicBool,
    events: broadcast::Sender<AuthStateChange>,
}

impl SupabaseClient {
    #[must_use]
    pub fn new(base_url: &Url, anon_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            base: base_url.as_str().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session: RwLock::new(None),
            verified: AtomicBool::new(false),
            events,
        }
    }

    /// # Errors
    ///
    /// Returns `AuthError::Other` when the backend section is incomplete or
    /// the URL is invalid.
    pub fn from_config(config: &BackendConfig) -> Result<Self, AuthError> {
        if !config.is_configured() {
            return Err(AuthError::Other(
                "backend not configured; set MACADAMY_BACKEND__URL and MACADAMY_BACKEND__ANON_KEY"
                    .into(),
            ));
        }
        let url = config
            .base_url()
            .map_err(|e| AuthError::Other(e.to_string()))?;
        Ok(Self::new(&url, config.anon_key.clone()))
    }

    /// Resume a session persisted by an earlier run. It is confirmed against
    /// `/auth/v1/user` on the first `get_session`.
    pub fn restore_session(&self, session: Option<BackendSession>) {
        self.set_session(session, false);
    }

    fn set_session(&self, session: Option<BackendSession>, verified: bool) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
        self.verified.store(verified, Ordering::Release);
    }

    #[must_use]
    pub fn current_session(&self) -> Option<BackendSession> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_session(&self, session: Option<BackendSession>, event: AuthEvent) {
        self.set_session(session.clone(), true);
        // No subscribers is fine.
        let _ = self.events.send(AuthStateChange { event, session });
    }

    fn bearer(&self) -> String {
        let token = self
            .current_session()
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token);
        format!("Bearer {token}")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<BackendSession, AuthError> {
        let url = self.endpoint(&format!("auth/v1/token?grant_type={grant_type}"));
        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = GoTrueError::parse(&body).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(if status.is_client_error() {
                AuthError::InvalidCredentials(message)
            } else {
                AuthError::Http(format!("{grant_type} grant: {message}"))
            });
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Http(format!("parse token response: {e}")))?;
        Ok(token.into_session(Utc::now()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<BackendSession, AuthError> {
        let session = self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;
        tracing::debug!(user_id = %session.user.id, "session refreshed");
        self.replace_session(Some(session.clone()), AuthEvent::TokenRefreshed);
        Ok(session)
    }

    /// Resolve the user behind `access_token`.
    ///
    /// Returns `Ok(None)` when the server no longer accepts the token.
    async fn fetch_user(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
        let resp = self
            .http
            .get(self.endpoint("auth/v1/user"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Http(format!("fetch user: HTTP {status}: {body}")));
        }

        let user: UserRecord = resp
            .json()
            .await
            .map_err(|e| AuthError::Http(format!("parse user response: {e}")))?;
        Ok(Some(user.into_identity()))
    }

    async fn verify(&self, mut session: BackendSession) -> Result<Option<BackendSession>, AuthError> {
        match self.fetch_user(&session.access_token).await {
            Ok(Some(user)) => {
                session.user = user;
                self.set_session(Some(session.clone()), true);
                Ok(Some(session))
            }
            Ok(None) => {
                tracing::warn!(user_id = %session.user.id, "stored session rejected by server");
                self.replace_session(None, AuthEvent::SignedOut);
                Ok(None)
            }
            Err(error) => Err(AuthError::SessionLookup(error.to_string())),
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn get_session(&self) -> Result<Option<BackendSession>, AuthError> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        if !is_near_expiry(&session, Utc::now()) {
            if self.verified.load(Ordering::Acquire) {
                return Ok(Some(session));
            }
            return self.verify(session).await;
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            tracing::debug!("stored session expired without refresh token");
            self.set_session(None, false);
            return Ok(None);
        };
        match self.refresh(&refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(AuthError::InvalidCredentials(message)) => {
                tracing::warn!(%message, "refresh token rejected; session dropped");
                self.replace_session(None, AuthEvent::SignedOut);
                Ok(None)
            }
            Err(error) => Err(AuthError::SessionLookup(error.to_string())),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BackendSession, AuthError> {
        let session = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        tracing::info!(user_id = %session.user.id, "signed in");
        self.replace_session(Some(session.clone()), AuthEvent::SignedIn);
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.current_session() else {
            self.replace_session(None, AuthEvent::SignedOut);
            return Ok(());
        };

        let result = self
            .http
            .post(self.endpoint("auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await;

        // The local session goes regardless of what the server said.
        self.replace_session(None, AuthEvent::SignedOut);

        let resp = result?;
        let status = resp.status();
        // An already-expired token cannot be revoked; treat as signed out.
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(AuthError::Http(format!("logout: HTTP {status}: {body}")))
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}

#[async_trait]
impl RpcClient for SupabaseClient {
    async fn call(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{}", urlencoding::encode(function)));
        tracing::debug!(function, "rpc call");
        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
            .json(&args)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AuthError::Rpc {
                function: function.to_string(),
                source: rpc_error_from_body(status, &body),
            });
        }

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| AuthError::Http(format!("parse {function} response: {e}")))
    }
}

#[async_trait]
impl ProfileSource for SupabaseClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, AuthError> {
        let url = self.endpoint(&format!(
            "rest/v1/profiles?select={}&id=eq.{}",
            urlencoding::encode(PROFILE_SELECT),
            urlencoding::encode(user_id)
        ));
        let resp = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Http(format!(
                "fetch profile: HTTP {status}: {body}"
            )));
        }

        let rows: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| AuthError::Http(format!("parse profile response: {e}")))?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::ProfileNotFound(user_id.to_string()))?;
        Ok(ProfileRow::decode(row)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn token_response_prefers_absolute_expiry() {
        let now = Utc::now();
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "refresh_token": "r",
            "user": {"id": "user-1", "email": "a@b.co", "aud": "authenticated"}
        }))
        .unwrap();

        let session = token.into_session(now);
        assert_eq!(session.expires_at.map(|t| t.timestamp()), Some(1_900_000_000));
        assert_eq!(session.user, Identity::new("user-1").with_email("a@b.co"));
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn token_response_falls_back_to_relative_expiry() {
        let now = Utc::now();
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "expires_in": 60,
            "user": {"id": "user-1"}
        }))
        .unwrap();

        assert_eq!(token.into_session(now).expires_at, Some(now + TimeDelta::seconds(60)));
    }

    #[test]
    fn token_response_ignores_out_of_range_expiry() {
        let now = Utc::now();
        for expires_in in [i64::MAX, 1_000_000_000_000_000] {
            let token: TokenResponse = serde_json::from_value(serde_json::json!({
                "access_token": "a",
                "expires_in": expires_in,
                "user": {"id": "user-1"}
            }))
            .unwrap();

            assert_eq!(token.into_session(now).expires_at, None);
        }
    }

    #[test]
    fn user_record_drops_blank_email() {
        let record: UserRecord =
            serde_json::from_value(serde_json::json!({"id": "user-1", "email": ""})).unwrap();
        assert_eq!(record.into_identity(), Identity::new("user-1"));
    }

    #[test]
    fn gotrue_error_message_variants() {
        assert_eq!(
            GoTrueError::parse(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            GoTrueError::parse(r#"{"code":400,"msg":"Email not confirmed"}"#).as_deref(),
            Some("Email not confirmed")
        );
        assert_eq!(GoTrueError::parse("<html>"), None);
    }

    #[test]
    fn rpc_error_body_keeps_code() {
        let err = rpc_error_from_body(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"code":"42501","message":"not a member of the selected organization","details":null,"hint":null}"#,
        );
        assert!(err.is_not_member());
    }

    #[test]
    fn unstructured_rpc_error_keeps_status() {
        let err = rpc_error_from_body(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.code, None);
        assert!(err.message.contains("502"));
        assert!(err.message.contains("upstream down"));
    }

    #[test]
    fn anonymous_requests_use_anon_key() {
        let client = SupabaseClient::new(&Url::parse("https://x.supabase.co/").unwrap(), "anon");
        assert_eq!(client.bearer(), "Bearer anon");
        assert_eq!(client.endpoint("rest/v1/rpc/f"), "https://x.supabase.co/rest/v1/rpc/f");

        client.restore_session(Some(BackendSession {
            access_token: "tok".into(),
            refresh_token: None,
            expires_at: None,
            user: Identity::new("u"),
        }));
        assert_eq!(client.bearer(), "Bearer tok");
    }

    #[tokio::test]
    async fn sign_out_without_session_emits_signed_out() {
        let client = SupabaseClient::new(&Url::parse("https://x.supabase.co").unwrap(), "anon");
        let mut events = client.subscribe();

        client.sign_out().await.unwrap();

        let change = events.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedOut);
        assert!(change.session.is_none());
    }
}
