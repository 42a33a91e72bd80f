//! Typed remote procedure calls.
//!
//! Argument structs serialize to the exact parameter names the database
//! functions declare; results are validated at this boundary so callers only
//! ever see domain types.

use std::collections::HashSet;
use std::sync::Arc;

use macadamy_core::organization::{
    INACTIVE_MEMBERSHIP_ROW, InactiveMembershipRow, MEMBER_ORGANIZATION_ROW,
    MemberOrganizationRow, decode_rows, member_organization_ids,
};
use macadamy_core::selection::active_org_id_set;
use macadamy_core::{DecodeError, InactiveMembership, MemberOrganization};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::ports::RpcClient;

pub const GET_MY_MEMBER_ORGANIZATIONS: &str = "get_my_member_organizations";
pub const GET_MY_INACTIVE_MEMBER_ORGANIZATIONS: &str = "get_my_inactive_member_organizations";
pub const SET_MY_PRIMARY_ORGANIZATION: &str = "set_my_primary_organization";
pub const CREATE_DEMO_ENVIRONMENT: &str = "create_demo_environment";
pub const EXECUTE_FULL_DEMO_CLONE: &str = "execute_full_demo_clone";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetPrimaryOrganizationArgs<'a> {
    pub p_organization_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDemoEnvironmentArgs<'a> {
    pub base_profile_email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteFullDemoCloneArgs<'a> {
    pub p_session_id: &'a str,
}

/// Ids returned by `create_demo_environment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoEnvironmentCreated {
    pub session_id: String,
    pub profile_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct DemoEnvironmentRow {
    created_session_id: Option<String>,
    created_profile_id: Option<String>,
}

/// One decoded row of a listing; bad rows are kept as errors so the caller
/// decides whether to skip or reject.
pub type RowResult<T> = Result<T, DecodeError>;

/// Typed facade over an [`RpcClient`].
#[derive(Clone)]
pub struct RpcApi {
    client: Arc<dyn RpcClient>,
}

impl RpcApi {
    #[must_use]
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self { client }
    }

    async fn call<A: Serialize + Sync>(
        &self,
        function: &str,
        args: &A,
    ) -> Result<serde_json::Value, AuthError> {
        let args = serde_json::to_value(args)
            .map_err(|e| AuthError::Other(format!("encode {function} args: {e}")))?;
        self.client.call(function, args).await
    }

    /// Memberships the caller currently holds, rows decoded individually.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the call fails or the payload is not an array.
    pub async fn get_my_member_organizations(
        &self,
    ) -> Result<Vec<RowResult<MemberOrganization>>, AuthError> {
        let value = self
            .call(GET_MY_MEMBER_ORGANIZATIONS, &serde_json::json!({}))
            .await?;
        Ok(decode_rows::<MemberOrganizationRow, MemberOrganization>(
            MEMBER_ORGANIZATION_ROW,
            value,
        )?)
    }

    /// Ids of the memberships the caller currently holds.
    ///
    /// Only the `id` column is read, so a row with a missing name or role
    /// still counts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the call fails or the payload is not an array.
    pub async fn get_my_member_organization_ids(&self) -> Result<HashSet<String>, AuthError> {
        let value = self
            .call(GET_MY_MEMBER_ORGANIZATIONS, &serde_json::json!({}))
            .await?;
        Ok(active_org_id_set(member_organization_ids(value)?))
    }

    /// Memberships the caller used to hold.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the call fails or the payload is not an array.
    pub async fn get_my_inactive_member_organizations(
        &self,
    ) -> Result<Vec<RowResult<InactiveMembership>>, AuthError> {
        let value = self
            .call(GET_MY_INACTIVE_MEMBER_ORGANIZATIONS, &serde_json::json!({}))
            .await?;
        Ok(decode_rows::<InactiveMembershipRow, InactiveMembership>(
            INACTIVE_MEMBERSHIP_ROW,
            value,
        )?)
    }

    /// Persist `organization_id` as the caller's primary organization.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rpc` with code `42501` when the caller is not an
    /// active member.
    pub async fn set_my_primary_organization(&self, organization_id: &str) -> Result<(), AuthError> {
        self.call(
            SET_MY_PRIMARY_ORGANIZATION,
            &SetPrimaryOrganizationArgs {
                p_organization_id: organization_id,
            },
        )
        .await?;
        Ok(())
    }

    /// Create the demo profile and session rows cloned from `base_profile_email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DemoClone` if the function returns no ids.
    pub async fn create_demo_environment(
        &self,
        base_profile_email: &str,
    ) -> Result<DemoEnvironmentCreated, AuthError> {
        let value = self
            .call(
                CREATE_DEMO_ENVIRONMENT,
                &CreateDemoEnvironmentArgs { base_profile_email },
            )
            .await?;

        // Set-returning functions answer with an array; scalar ones with an object.
        let value = match value {
            serde_json::Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            other => other,
        };
        let row: DemoEnvironmentRow = serde_json::from_value(value).unwrap_or_default();

        match (row.created_session_id, row.created_profile_id) {
            (Some(session_id), Some(profile_id))
                if !session_id.is_empty() && !profile_id.is_empty() =>
            {
                Ok(DemoEnvironmentCreated {
                    session_id,
                    profile_id,
                })
            }
            _ => Err(AuthError::DemoClone(format!(
                "{CREATE_DEMO_ENVIRONMENT} returned no created_session_id/created_profile_id"
            ))),
        }
    }

    /// Populate every demo table for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the clone fails.
    pub async fn execute_full_demo_clone(&self, session_id: &str) -> Result<(), AuthError> {
        self.call(
            EXECUTE_FULL_DEMO_CLONE,
            &ExecuteFullDemoCloneArgs {
                p_session_id: session_id,
            },
        )
        .await?;
        Ok(())
    }
}
