use clap::{Args, Subcommand};

/// Organization commands.
#[derive(Clone, Debug, Subcommand)]
pub enum OrgCommands {
    /// List active memberships.
    List,
    /// List memberships that have been removed.
    Inactive,
    /// Make an organization the primary one.
    Switch(OrgSwitchArgs),
    /// Check the selected organization against active memberships.
    Validate,
}

#[derive(Clone, Debug, Args)]
pub struct OrgSwitchArgs {
    /// Organization to make primary.
    pub organization_id: String,
}
