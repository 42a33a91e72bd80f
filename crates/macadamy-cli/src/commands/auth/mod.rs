mod demo;
mod login;
mod logout;
mod status;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthCommands;
use crate::context::CliContext;

/// Handle `mcd auth <subcommand>`.
pub async fn handle(action: &AuthCommands, ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        AuthCommands::Login(args) => login::handle(args, ctx, flags).await,
        AuthCommands::Demo => demo::handle(ctx, flags).await,
        AuthCommands::Logout => logout::handle(ctx, flags).await,
        AuthCommands::Status => status::handle(ctx, flags).await,
    }
}
