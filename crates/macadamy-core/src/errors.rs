//! Error types shared by the Macadamy crates.
//!
//! Transport and storage failures live in the crates that own them
//! (`AuthError`, `ConfigError`). This module only covers values that fail
//! validation on their way into a domain type.

use thiserror::Error;

/// A value that does not satisfy a domain type's constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Data failed validation (unknown label, bad format).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure to turn an untyped backend row into a validated domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required field was absent or `null`.
    #[error("{row}: missing field '{field}'")]
    MissingField {
        row: &'static str,
        field: &'static str,
    },

    /// A required string field was present but blank.
    #[error("{row}: field '{field}' must not be empty")]
    EmptyField {
        row: &'static str,
        field: &'static str,
    },

    /// A field carried a value outside its domain.
    #[error("{row}: invalid value for '{field}': {reason}")]
    InvalidValue {
        row: &'static str,
        field: &'static str,
        reason: String,
    },

    /// The payload was not the expected JSON shape at all.
    #[error("{row}: malformed payload: {reason}")]
    Malformed { row: &'static str, reason: String },
}

impl DecodeError {
    /// Build a [`DecodeError::Malformed`] from a `serde_json` failure.
    #[must_use]
    pub fn malformed(row: &'static str, error: &serde_json::Error) -> Self {
        Self::Malformed {
            row,
            reason: error.to_string(),
        }
    }
}

/// Require a non-blank string field, reporting which row and field failed.
///
/// # Errors
///
/// Returns [`DecodeError::MissingField`] for `None` and
/// [`DecodeError::EmptyField`] for whitespace-only values.
pub fn require_text(
    row: &'static str,
    field: &'static str,
    value: Option<String>,
) -> Result<String, DecodeError> {
    let value = value.ok_or(DecodeError::MissingField { row, field })?;
    if value.trim().is_empty() {
        return Err(DecodeError::EmptyField { row, field });
    }
    Ok(value)
}

/// Normalize an optional string: blank values become `None`.
#[must_use]
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_reports_missing_and_empty() {
        assert_eq!(
            require_text("row", "id", None),
            Err(DecodeError::MissingField {
                row: "row",
                field: "id"
            })
        );
        assert_eq!(
            require_text("row", "id", Some("  ".into())),
            Err(DecodeError::EmptyField {
                row: "row",
                field: "id"
            })
        );
        assert_eq!(require_text("row", "id", Some("x".into())), Ok("x".into()));
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(optional_text(Some(" ".into())), None);
        assert_eq!(optional_text(Some("a".into())).as_deref(), Some("a"));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn decode_error_display_names_row_and_field() {
        let err = DecodeError::MissingField {
            row: "member organization",
            field: "name",
        };
        assert_eq!(err.to_string(), "member organization: missing field 'name'");
    }
}
