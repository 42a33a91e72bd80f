use macadamy_core::DecodeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Postgres `insufficient_privilege`, raised by membership-guarded functions.
pub const INSUFFICIENT_PRIVILEGE: &str = "42501";

const NOT_A_MEMBER_MESSAGE: &str = "not a member of the selected organization";

/// Structured error body returned by a failing remote procedure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct RpcError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RpcError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// The server refused because the caller is not an active member of the
    /// requested organization.
    #[must_use]
    pub fn is_not_member(&self) -> bool {
        self.code.as_deref() == Some(INSUFFICIENT_PRIVILEGE)
            && self.message.to_lowercase().contains(NOT_A_MEMBER_MESSAGE)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated; run `mcd auth login`")]
    NotAuthenticated,

    #[error("session lookup failed: {0}")]
    SessionLookup(String),

    #[error("sign-in failed: {0}")]
    InvalidCredentials(String),

    #[error("please enter a valid email address: {0}")]
    InvalidEmail(String),

    #[error("rpc {function} failed: {source}")]
    Rpc {
        function: String,
        #[source]
        source: RpcError,
    },

    #[error("backend request failed: {0}")]
    Http(String),

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] DecodeError),

    #[error("no profile found for user {0}")]
    ProfileNotFound(String),

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u128 },

    #[error("token store error: {0}")]
    TokenStoreError(String),

    #[error("local storage error: {0}")]
    Storage(String),

    #[error("demo environment configuration error: {0}")]
    DemoConfig(String),

    #[error("failed to create demo environment: {0}")]
    DemoClone(String),

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Whether this is the server-side "not a member" refusal.
    #[must_use]
    pub fn is_not_member(&self) -> bool {
        matches!(self, Self::Rpc { source, .. } if source.is_not_member())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_member_requires_code_and_message() {
        let err = RpcError::new(
            "42501",
            "User is not a member of the selected organization",
        );
        assert!(err.is_not_member());

        let wrong_code = RpcError::new("P0001", "not a member of the selected organization");
        assert!(!wrong_code.is_not_member());

        let wrong_message = RpcError::new("42501", "permission denied for table profiles");
        assert!(!wrong_message.is_not_member());
    }

    #[test]
    fn auth_error_is_not_member_only_for_rpc() {
        let err = AuthError::Rpc {
            function: "set_my_primary_organization".into(),
            source: RpcError::new("42501", "Not a member of the selected organization."),
        };
        assert!(err.is_not_member());
        assert!(!AuthError::NotAuthenticated.is_not_member());
    }

    #[test]
    fn rpc_error_deserializes_postgrest_body() {
        let body = r#"{"code":"42501","details":null,"hint":null,"message":"not a member of the selected organization"}"#;
        let err: RpcError = serde_json::from_str(body).unwrap();
        assert_eq!(err.code.as_deref(), Some("42501"));
        assert!(err.is_not_member());
    }
}
