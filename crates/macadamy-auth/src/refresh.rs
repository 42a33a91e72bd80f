use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::AuthError;
use crate::ports::BackendSession;

/// Sessions expiring within this window are refreshed before use.
pub const EXPIRY_BUFFER: TimeDelta = TimeDelta::seconds(60);

/// Decode the JWT `exp` claim without verifying the signature.
///
/// # Errors
///
/// Returns `AuthError::Other` if the JWT format is invalid or the `exp` claim
/// is missing or cannot be parsed.
pub fn decode_expiry(jwt: &str) -> Result<DateTime<Utc>, AuthError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::Other("invalid JWT format".into()));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| AuthError::Other(format!("base64 decode failed: {e}")))?;
    let value: serde_json::Value = serde_json::from_slice(&payload)
        .map_err(|e| AuthError::Other(format!("JSON parse failed: {e}")))?;
    let exp = value["exp"]
        .as_i64()
        .ok_or_else(|| AuthError::Other("missing exp claim".into()))?;
    DateTime::from_timestamp(exp, 0).ok_or_else(|| AuthError::Other("invalid exp timestamp".into()))
}

/// Effective expiry of a session: the recorded one, else the token's claim.
#[must_use]
pub fn session_expiry(session: &BackendSession) -> Option<DateTime<Utc>> {
    session
        .expires_at
        .or_else(|| decode_expiry(&session.access_token).ok())
}

/// `true` when the session expires within [`EXPIRY_BUFFER`] of `now`.
/// Sessions with no known expiry are treated as fresh.
#[must_use]
pub fn is_near_expiry(session: &BackendSession, now: DateTime<Utc>) -> bool {
    session_expiry(session).is_some_and(|exp| exp - now <= EXPIRY_BUFFER)
}
