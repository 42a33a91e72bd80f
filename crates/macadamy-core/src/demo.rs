use chrono::{DateTime, TimeDelta, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Local storage key the demo session record lives under.
pub const DEMO_SESSION_STORAGE_KEY: &str = "demo_session";

/// Default lifetime of a cached demo session.
pub const DEFAULT_DEMO_SESSION_TTL: TimeDelta = TimeDelta::hours(12);

/// Cached record of a cloned demo environment.
///
/// Stored as `{"sessionId", "userId", "createdAt"}` with `createdAt` in epoch
/// milliseconds, so records written by the web client stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemoSession {
    /// Clone session id shared by all cloned rows.
    pub session_id: String,
    /// Profile id of the cloned demo user.
    pub user_id: String,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
}

impl DemoSession {
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            created_at: created_at.timestamp_millis(),
        }
    }

    /// Creation time as a `DateTime`, if the stored millis are representable.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }

    /// A session is expired once it is strictly older than `ttl`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.timestamp_millis().saturating_sub(self.created_at) > ttl.num_milliseconds()
    }

    /// Whether this session was cloned for `user_id`.
    #[must_use]
    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
