use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::require_profile;
use crate::context::CliContext;
use crate::output::output;

#[derive(Serialize)]
struct ValidateResponse {
    previous_selection: Option<String>,
    selected_organization_id: Option<String>,
    validated_active_membership: bool,
    cleared: bool,
}

pub async fn handle(ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    require_profile(ctx).await?;
    let previous_selection = ctx.session.store.selected_organization_id();

    let validation = ctx.session.validator.validate().await?;

    output(
        &ValidateResponse {
            previous_selection,
            selected_organization_id: ctx.session.store.selected_organization_id(),
            validated_active_membership: validation.validated_active_membership,
            cleared: validation.should_clear_selection,
        },
        flags.format,
    )
}
