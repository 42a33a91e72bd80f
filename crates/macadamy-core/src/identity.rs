use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Authenticated principal for the current session.
///
/// Produced by `macadamy-auth` when a backend session is resolved; lives only
/// in memory for the lifetime of that session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    /// Stable backend user id (JWT `sub`).
    pub id: String,
    /// Email on the auth record, when the backend returned one.
    pub email: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
