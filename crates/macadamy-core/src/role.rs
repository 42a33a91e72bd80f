//! Application-level user roles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Role stored on the profile row (`profiles.role`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SystemAdmin,
    OrgAdmin,
    OrgSupervisor,
    OrgUser,
    OrgViewer,
    Inspector,
    Auditor,
}

impl UserRole {
    pub const ALL: [Self; 7] = [
        Self::SystemAdmin,
        Self::OrgAdmin,
        Self::OrgSupervisor,
        Self::OrgUser,
        Self::OrgViewer,
        Self::Inspector,
        Self::Auditor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::OrgAdmin => "org_admin",
            Self::OrgSupervisor => "org_supervisor",
            Self::OrgUser => "org_user",
            Self::OrgViewer => "org_viewer",
            Self::Inspector => "inspector",
            Self::Auditor => "auditor",
        }
    }

    /// Lenient parse used at the profile boundary: unknown or blank roles
    /// become `None` instead of failing the whole profile.
    #[must_use]
    pub fn validate(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|r| !r.is_empty())
            .and_then(|r| r.parse().ok())
    }

    /// Administrative roles land on the admin dashboard after login.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::SystemAdmin | Self::OrgAdmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown user role '{s}'")))
    }
}
