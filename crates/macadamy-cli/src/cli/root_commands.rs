use clap::Subcommand;

use crate::cli::subcommands::{AuthCommands, OrgCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Sign-in, sign-out and session status.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Organization memberships and the primary organization.
    Org {
        #[command(subcommand)]
        action: OrgCommands,
    },
}
