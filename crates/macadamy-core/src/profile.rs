//! Enriched profile records.
//!
//! The backend returns a `profiles` row with joined organization, job title
//! and avatar data. [`ProfileRow`] mirrors that untyped shape; [`Profile`] is
//! the validated value every other crate works with.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{DecodeError, optional_text, require_text};
use crate::role::UserRole;

const ROW: &str = "profile";

/// Organization summary joined onto a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OrganizationSummary {
    pub id: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Job title joined onto a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobTitle {
    pub id: Option<String>,
    pub title: String,
    pub is_custom: bool,
}

/// Validated profile of the signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Profile {
    pub id: String,
    pub role: Option<UserRole>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub avatar_id: Option<String>,
    pub avatar_url: Option<String>,
    /// Primary organization. `None` when the user has not picked one.
    pub organization_id: Option<String>,
    pub organization: Option<OrganizationSummary>,
    pub job_title_id: Option<String>,
    pub job_title: Option<JobTitle>,
    /// Set when the identity belongs to a cached demo session.
    pub is_demo_user: bool,
    /// Demo clone session id for demo users.
    pub session_id: Option<String>,
}

impl Profile {
    /// Display name of the joined organization, if any.
    #[must_use]
    pub fn organization_name(&self) -> Option<&str> {
        self.organization.as_ref().map(|o| o.name.as_str())
    }

    /// Mark the profile as belonging to a demo clone session.
    pub fn annotate_demo(&mut self, session_id: impl Into<String>) {
        self.is_demo_user = true;
        self.session_id = Some(session_id.into());
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobTitleRow {
    pub id: Option<String>,
    pub title: Option<String>,
    pub is_custom: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvatarRow {
    pub url: Option<String>,
}

/// Raw `profiles` row as returned by the profile-fetch collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileRow {
    pub id: Option<String>,
    pub role: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub avatar_id: Option<String>,
    pub organization_id: Option<String>,
    pub job_title_id: Option<String>,
    pub session_id: Option<String>,
    pub organizations: Option<OrganizationRow>,
    pub job_titles: Option<JobTitleRow>,
    pub avatars: Option<AvatarRow>,
}

impl ProfileRow {
    /// Decode a JSON value, failing on anything that is not a profile object.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for malformed JSON or a row that fails validation.
    pub fn decode(value: serde_json::Value) -> Result<Profile, DecodeError> {
        let row: Self = serde_json::from_value(value).map_err(|e| DecodeError::malformed(ROW, &e))?;
        Profile::try_from(row)
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DecodeError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let id = require_text(ROW, "id", row.id)?;

        let organization = row.organizations.and_then(|org| {
            let name = optional_text(org.name)?;
            Some(OrganizationSummary {
                id: optional_text(org.id),
                name,
                address: optional_text(org.address),
                phone: optional_text(org.phone),
                website: optional_text(org.website),
            })
        });

        let job_title = row.job_titles.and_then(|jt| {
            let title = optional_text(jt.title)?;
            Some(JobTitle {
                id: optional_text(jt.id),
                title,
                is_custom: jt.is_custom.unwrap_or(false),
            })
        });

        let session_id = optional_text(row.session_id);

        Ok(Self {
            id,
            role: UserRole::validate(row.role.as_deref()),
            full_name: optional_text(row.full_name),
            username: optional_text(row.username),
            email: row.email.unwrap_or_default(),
            phone: optional_text(row.phone),
            location: optional_text(row.location),
            avatar_id: optional_text(row.avatar_id),
            avatar_url: row.avatars.and_then(|a| optional_text(a.url)),
            organization_id: optional_text(row.organization_id),
            organization,
            job_title_id: optional_text(row.job_title_id),
            job_title,
            is_demo_user: false,
            session_id,
        })
    }
}
