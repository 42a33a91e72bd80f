//! Organization membership rows.
//!
//! `get_my_member_organizations` and `get_my_inactive_member_organizations`
//! return untyped JSON arrays. Rows are validated one at a time so a bad row
//! never hides the rest of the listing. Membership checks only need the id,
//! so [`member_organization_ids`] reads it without validating the other
//! columns.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{DecodeError, optional_text, require_text};

const MEMBER_ROW: &str = "member organization";
const INACTIVE_ROW: &str = "inactive membership";

/// An organization the caller is currently an active member of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MemberOrganization {
    pub id: String,
    pub name: String,
    /// Raw membership role label (e.g. `org_admin`). Older rows put a job
    /// title id here.
    pub role: Option<String>,
    pub permission_role: Option<String>,
    pub role_name: Option<String>,
    pub job_title_name: Option<String>,
}

impl MemberOrganization {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.map(str::to_string),
            permission_role: None,
            role_name: None,
            job_title_name: None,
        }
    }

    /// Effective permission role: explicit column first, else the raw role
    /// when it is not a job-title id.
    #[must_use]
    pub fn effective_permission_role(&self) -> Option<&str> {
        self.permission_role
            .as_deref()
            .or_else(|| self.role.as_deref().filter(|r| !looks_like_uuid(r)))
    }

    /// Human label for the membership role.
    #[must_use]
    pub fn role_label(&self) -> Option<String> {
        if let Some(permission) = self.permission_role.as_deref() {
            return Some(title_case_label(permission));
        }
        if let Some(name) = self.role_name.as_deref() {
            return Some(name.to_string());
        }
        match self.role.as_deref() {
            Some(role) if !looks_like_uuid(role) => Some(title_case_label(role)),
            role => self
                .job_title_name
                .clone()
                .or_else(|| role.map(str::to_string)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberOrganizationRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub permission_role: Option<String>,
    pub role_name: Option<String>,
    pub job_title_name: Option<String>,
}

impl TryFrom<MemberOrganizationRow> for MemberOrganization {
    type Error = DecodeError;

    fn try_from(row: MemberOrganizationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: require_text(MEMBER_ROW, "id", row.id)?,
            name: require_text(MEMBER_ROW, "name", row.name)?,
            role: optional_text(row.role),
            permission_role: optional_text(row.permission_role),
            role_name: optional_text(row.role_name),
            job_title_name: optional_text(row.job_title_name),
        })
    }
}

/// A membership the caller used to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InactiveMembership {
    pub organization_id: String,
    pub organization_name: String,
    pub membership_deleted_at: DateTime<Utc>,
    pub role_last_known: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InactiveMembershipRow {
    pub organization_id: Option<String>,
    pub organization_name: Option<String>,
    pub membership_deleted_at: Option<String>,
    pub role_last_known: Option<String>,
}

impl TryFrom<InactiveMembershipRow> for InactiveMembership {
    type Error = DecodeError;

    fn try_from(row: InactiveMembershipRow) -> Result<Self, Self::Error> {
        let organization_id = require_text(INACTIVE_ROW, "organization_id", row.organization_id)?;
        let organization_name =
            require_text(INACTIVE_ROW, "organization_name", row.organization_name)?;
        let raw_deleted_at =
            require_text(INACTIVE_ROW, "membership_deleted_at", row.membership_deleted_at)?;
        let membership_deleted_at = DateTime::parse_from_rfc3339(&raw_deleted_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DecodeError::InvalidValue {
                row: INACTIVE_ROW,
                field: "membership_deleted_at",
                reason: e.to_string(),
            })?;

        Ok(Self {
            organization_id,
            organization_name,
            membership_deleted_at,
            role_last_known: optional_text(row.role_last_known),
        })
    }
}

/// Decode a JSON array row by row.
///
/// The outer `Result` fails only when the payload is not an array; each inner
/// `Result` reports one row.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] when `value` is not a JSON array.
pub fn decode_rows<R, T>(
    row: &'static str,
    value: serde_json::Value,
) -> Result<Vec<Result<T, DecodeError>>, DecodeError>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = DecodeError>,
{
    let serde_json::Value::Array(items) = value else {
        return Err(DecodeError::Malformed {
            row,
            reason: "expected a JSON array".into(),
        });
    };

    Ok(items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<R>(item)
                .map_err(|e| DecodeError::malformed(row, &e))
                .and_then(T::try_from)
        })
        .collect())
}

#[derive(Deserialize)]
struct MemberIdRow {
    id: Option<String>,
}

/// Organization ids from a `get_my_member_organizations` payload.
///
/// A row counts when its `id` is a non-blank string, whatever state its
/// other columns are in. Rows without a usable id are skipped.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if the payload is not a JSON array.
pub fn member_organization_ids(value: serde_json::Value) -> Result<Vec<String>, DecodeError> {
    let serde_json::Value::Array(items) = value else {
        return Err(DecodeError::Malformed {
            row: MEMBER_ROW,
            reason: "expected a JSON array".into(),
        });
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<MemberIdRow>(item).ok())
        .filter_map(|row| optional_text(row.id))
        .collect())
}

/// Row label used in member-organization decode errors.
pub const MEMBER_ORGANIZATION_ROW: &str = MEMBER_ROW;
/// Row label used in inactive-membership decode errors.
pub const INACTIVE_MEMBERSHIP_ROW: &str = INACTIVE_ROW;

/// `org_supervisor` → `Org Supervisor`.
#[must_use]
pub fn title_case_label(value: &str) -> String {
    value
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical 8-4-4-4-12 hex layout check; used to tell job-title ids apart
/// from role names in legacy rows.
#[must_use]
pub fn looks_like_uuid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    let expected = [8, 4, 4, 4, 12];
    groups.len() == expected.len()
        && groups
            .iter()
            .zip(expected)
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_member_listing() {
        let rows = decode_rows::<MemberOrganizationRow, MemberOrganization>(
            MEMBER_ORGANIZATION_ROW,
            json!([
                {"id": "org-1", "name": "Org One", "role": "org_admin"},
                {"id": "org-2", "name": "Org Two", "role": null},
                {"id": "org-3", "name": ""}
            ]),
        )
        .expect("listing decodes");

        assert_eq!(rows[0], Ok(MemberOrganization::new("org-1", "Org One", Some("org_admin"))));
        assert_eq!(rows[1], Ok(MemberOrganization::new("org-2", "Org Two", None)));
        assert_eq!(
            rows[2],
            Err(DecodeError::EmptyField {
                row: MEMBER_ORGANIZATION_ROW,
                field: "name"
            })
        );
    }

    #[test]
    fn member_ids_ignore_other_columns() {
        let ids = member_organization_ids(json!([
            {"id": "org-1", "name": null, "role": "org_user"},
            {"id": "org-2", "name": ""},
            {"id": "  ", "name": "Blank"},
            {"name": "No Id"},
            "not a row"
        ]))
        .expect("listing decodes");

        assert_eq!(ids, vec!["org-1".to_owned(), "org-2".to_owned()]);
    }

    #[test]
    fn non_array_payload_is_malformed() {
        let err = member_organization_ids(json!({"id": "org-1"})).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));

        let err = decode_rows::<MemberOrganizationRow, MemberOrganization>(
            MEMBER_ORGANIZATION_ROW,
            json!({"id": "org-1"}),
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn decode_rows_keeps_per_row_results() {
        let rows = decode_rows::<InactiveMembershipRow, InactiveMembership>(
            INACTIVE_MEMBERSHIP_ROW,
            json!([
                {"organization_id": "org-1", "organization_name": "Old Org",
                 "membership_deleted_at": "2025-01-02T03:04:05Z", "role_last_known": "org_user"},
                {"organization_id": "org-2", "organization_name": "Bad",
                 "membership_deleted_at": "yesterday"},
                {"organization_id": "", "organization_name": "Blank",
                 "membership_deleted_at": "2025-01-02T03:04:05Z"}
            ]),
        )
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(DecodeError::InvalidValue { .. })));
        assert!(matches!(rows[2], Err(DecodeError::EmptyField { .. })));
    }

    #[rstest]
    #[case("org_admin", "Org Admin")]
    #[case("ORG_VIEWER", "Org Viewer")]
    #[case("inspector", "Inspector")]
    #[case("", "")]
    fn title_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(title_case_label(input), expected);
    }

    #[test]
    fn role_label_prefers_permission_role() {
        let mut org = MemberOrganization::new("o", "O", Some("org_user"));
        assert_eq!(org.role_label().as_deref(), Some("Org User"));

        org.permission_role = Some("org_supervisor".into());
        assert_eq!(org.role_label().as_deref(), Some("Org Supervisor"));
    }

    #[test]
    fn uuid_role_falls_back_to_job_title_name() {
        let mut org = MemberOrganization::new(
            "o",
            "O",
            Some("3f2b8c1e-9a4d-4c6e-8b1a-0123456789ab"),
        );
        assert_eq!(org.effective_permission_role(), None);
        assert_eq!(
            org.role_label().as_deref(),
            Some("3f2b8c1e-9a4d-4c6e-8b1a-0123456789ab")
        );

        org.job_title_name = Some("Foreman".into());
        assert_eq!(org.role_label().as_deref(), Some("Foreman"));
    }

    #[test]
    fn uuid_detection() {
        assert!(looks_like_uuid("3f2b8c1e-9a4d-4c6e-8b1a-0123456789ab"));
        assert!(!looks_like_uuid("org_admin"));
        assert!(!looks_like_uuid("3f2b8c1e-9a4d-4c6e-8b1a-0123456789"));
    }
}
