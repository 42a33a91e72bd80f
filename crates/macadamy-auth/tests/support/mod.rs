//! In-process fake backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use macadamy_auth::storage::MemoryKeyValueStore;
use macadamy_auth::{
    AuthError, AuthEvent, AuthProvider, AuthStateChange, Backend, BackendSession,
    CollectingNotifier, ProfileSource, RpcClient, RpcError, SessionContext,
};
use macadamy_config::MacadamyConfig;
use macadamy_core::profile::ProfileRow;
use macadamy_core::{Identity, Profile};
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// RPC
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Rpc(RpcError),
    Http(String),
    /// Never completes.
    Hang,
}

struct Gate {
    function: String,
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
pub struct FakeRpc {
    calls: Mutex<Vec<(String, Value)>>,
    replies: Mutex<HashMap<String, Reply>>,
    gate: Mutex<Option<Gate>>,
}

impl FakeRpc {
    pub fn reply(&self, function: &str, reply: Reply) {
        lock(&self.replies).insert(function.to_string(), reply);
    }

    /// Hold the next call to `function` until the returned sender fires.
    /// The receiver resolves once the call has been entered.
    pub fn gate(&self, function: &str) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *lock(&self.gate) = Some(Gate {
            function: function.to_string(),
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }

    pub fn count(&self, function: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|(name, _)| name == function)
            .count()
    }
}

#[async_trait]
impl RpcClient for FakeRpc {
    async fn call(&self, function: &str, args: Value) -> Result<Value, AuthError> {
        lock(&self.calls).push((function.to_string(), args));

        let gate = {
            let mut slot = lock(&self.gate);
            if slot.as_ref().is_some_and(|g| g.function == function) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.await;
        }

        let reply = lock(&self.replies)
            .get(function)
            .cloned()
            .unwrap_or(Reply::Ok(Value::Null));
        match reply {
            Reply::Ok(value) => Ok(value),
            Reply::Rpc(source) => Err(AuthError::Rpc {
                function: function.to_string(),
                source,
            }),
            Reply::Http(message) => Err(AuthError::Http(message)),
            Reply::Hang => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeProfiles {
    profiles: Mutex<HashMap<String, Profile>>,
    failure: Mutex<Option<String>>,
    fetches: AtomicUsize,
}

impl FakeProfiles {
    pub fn insert(&self, profile: Profile) {
        lock(&self.profiles).insert(profile.id.clone(), profile);
    }

    pub fn fail_with(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileSource for FakeProfiles {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.failure).clone() {
            return Err(AuthError::Http(message));
        }
        lock(&self.profiles)
            .get(user_id)
            .cloned()
            .ok_or_else(|| AuthError::ProfileNotFound(user_id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub struct FakeAuth {
    session: Mutex<Option<BackendSession>>,
    lookup_error: Mutex<Option<String>>,
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    events: broadcast::Sender<AuthStateChange>,
    sign_ins: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl Default for FakeAuth {
    fn default() -> Self {
        Self {
            session: Mutex::new(None),
            lookup_error: Mutex::new(None),
            accounts: Mutex::new(HashMap::new()),
            events: broadcast::channel(16).0,
            sign_ins: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }
}

impl FakeAuth {
    pub fn sign_in_as(&self, user_id: &str) {
        *lock(&self.session) = Some(session_for(Identity::new(user_id)));
    }

    pub fn fail_lookup(&self, message: &str) {
        *lock(&self.lookup_error) = Some(message.to_string());
    }

    pub fn add_account(&self, email: &str, password: &str, user_id: &str) {
        lock(&self.accounts).insert(
            email.to_string(),
            (
                password.to_string(),
                Identity::new(user_id).with_email(email),
            ),
        );
    }

    pub fn emit(&self, event: AuthEvent, user_id: Option<&str>) {
        let session = user_id.map(|id| session_for(Identity::new(id)));
        let _ = self.events.send(AuthStateChange { event, session });
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    pub fn sign_ins(&self) -> usize {
        self.sign_ins.load(Ordering::SeqCst)
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

pub fn session_for(user: Identity) -> BackendSession {
    BackendSession {
        access_token: format!("token-{}", user.id),
        refresh_token: None,
        expires_at: None,
        user,
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn get_session(&self) -> Result<Option<BackendSession>, AuthError> {
        if let Some(message) = lock(&self.lookup_error).clone() {
            return Err(AuthError::SessionLookup(message));
        }
        Ok(lock(&self.session).clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BackendSession, AuthError> {
        self.sign_ins.fetch_add(1, Ordering::SeqCst);
        let account = lock(&self.accounts).get(email).cloned();
        match account {
            Some((expected, identity)) if expected == password => {
                let session = session_for(identity);
                *lock(&self.session) = Some(session.clone());
                let _ = self.events.send(AuthStateChange {
                    event: AuthEvent::SignedIn,
                    session: Some(session.clone()),
                });
                Ok(session)
            }
            _ => Err(AuthError::InvalidCredentials(
                "Invalid login credentials".into(),
            )),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *lock(&self.session) = None;
        let _ = self.events.send(AuthStateChange {
            event: AuthEvent::SignedOut,
            session: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub rpc: Arc<FakeRpc>,
    pub auth: Arc<FakeAuth>,
    pub profiles: Arc<FakeProfiles>,
    pub storage: Arc<MemoryKeyValueStore>,
    pub notices: Arc<CollectingNotifier>,
    pub ctx: SessionContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(MacadamyConfig::default())
    }

    pub fn with_config(config: MacadamyConfig) -> Self {
        let rpc = Arc::new(FakeRpc::default());
        let auth = Arc::new(FakeAuth::default());
        let profiles = Arc::new(FakeProfiles::default());
        let storage = Arc::new(MemoryKeyValueStore::new());
        let notices = Arc::new(CollectingNotifier::new());

        let ctx = SessionContext::with_backend(
            config,
            Backend {
                auth: auth.clone(),
                rpc: rpc.clone(),
                profiles: profiles.clone(),
            },
            storage.clone(),
            notices.clone(),
            None,
        );

        Self {
            rpc,
            auth,
            profiles,
            storage,
            notices,
            ctx,
        }
    }

    /// Signed-in `user_id` whose profile points at `organization_id`, loaded
    /// into the store.
    pub async fn signed_in(user_id: &str, organization_id: Option<&str>) -> Self {
        let h = Self::new();
        h.profiles.insert(profile(user_id, organization_id));
        h.auth.sign_in_as(user_id);
        h.ctx.bootstrap().await;
        h
    }
}

pub fn profile(user_id: &str, organization_id: Option<&str>) -> Profile {
    ProfileRow::decode(serde_json::json!({
        "id": user_id,
        "email": format!("{user_id}@example.com"),
        "role": "org_user",
        "organization_id": organization_id,
    }))
    .expect("valid profile row")
}

pub fn memberships(orgs: &[(&str, &str, &str)]) -> Value {
    Value::Array(
        orgs.iter()
            .map(|(id, name, role)| serde_json::json!({"id": id, "name": name, "role": role}))
            .collect(),
    )
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
