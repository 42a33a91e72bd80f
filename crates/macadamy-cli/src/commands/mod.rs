pub mod auth;
pub mod org;

use macadamy_auth::{AuthError, BootstrapOutcome};
use macadamy_core::Identity;

use crate::cli::{Commands, GlobalFlags};
use crate::context::CliContext;

/// Route a parsed command to its handler.
pub async fn dispatch(command: &Commands, ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Auth { action } => auth::handle(action, ctx, flags).await,
        Commands::Org { action } => org::handle(action, ctx, flags).await,
    }
}

/// Resume the stored session and return its identity.
///
/// Commands that act on memberships need a profile, so onboarding and
/// recovery states are refused too.
pub async fn require_profile(ctx: &CliContext) -> anyhow::Result<Identity> {
    match ctx.session.bootstrap().await {
        BootstrapOutcome::Authenticated { identity, .. } => Ok(identity),
        BootstrapOutcome::NeedsOnboarding { .. } => {
            anyhow::bail!("signed in, but no profile exists yet; complete onboarding first")
        }
        BootstrapOutcome::Failed { error } => anyhow::bail!("failed to resume session: {error}"),
        BootstrapOutcome::Anonymous | BootstrapOutcome::PasswordRecovery { .. } => {
            Err(AuthError::NotAuthenticated.into())
        }
    }
}
