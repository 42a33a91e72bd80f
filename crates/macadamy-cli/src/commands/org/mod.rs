mod inactive;
mod list;
mod switch;
mod validate;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::OrgCommands;
use crate::context::CliContext;

/// Handle `mcd org <subcommand>`.
pub async fn handle(action: &OrgCommands, ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        OrgCommands::List => list::handle(ctx, flags).await,
        OrgCommands::Inactive => inactive::handle(ctx, flags).await,
        OrgCommands::Switch(args) => switch::handle(args, ctx, flags).await,
        OrgCommands::Validate => validate::handle(ctx, flags).await,
    }
}

fn apply_limit<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}
