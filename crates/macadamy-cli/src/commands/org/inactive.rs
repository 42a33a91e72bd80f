use crate::cli::GlobalFlags;
use crate::commands::require_profile;
use crate::context::CliContext;
use crate::output::output;

pub async fn handle(ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let identity = require_profile(ctx).await?;
    let items = ctx.session.directory.list_inactive(&identity.id).await?;
    output(&super::apply_limit(items, flags.row_limit()), flags.format)
}
