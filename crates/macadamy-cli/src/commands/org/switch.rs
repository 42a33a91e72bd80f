use macadamy_auth::SwitchOutcome;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::OrgSwitchArgs;
use crate::commands::require_profile;
use crate::context::CliContext;
use crate::output::output;

#[derive(Serialize)]
struct SwitchResponse {
    organization_id: String,
    switched: bool,
    #[serde(flatten)]
    outcome: SwitchOutcome,
    selected_organization_id: Option<String>,
    notices: Vec<String>,
}

pub async fn handle(args: &OrgSwitchArgs, ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    require_profile(ctx).await?;

    let outcome = ctx
        .session
        .switcher
        .switch_with_outcome(&args.organization_id)
        .await;
    let switched = outcome.succeeded();

    output(
        &SwitchResponse {
            organization_id: args.organization_id.clone(),
            switched,
            outcome,
            selected_organization_id: ctx.session.store.selected_organization_id(),
            notices: ctx.drain_notices(),
        },
        flags.format,
    )?;

    if !switched {
        anyhow::bail!("primary organization was not changed");
    }
    Ok(())
}
