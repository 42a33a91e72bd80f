use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::require_profile;
use crate::context::CliContext;
use crate::output::output;

#[derive(Serialize)]
struct OrganizationRow {
    id: String,
    name: String,
    role: Option<String>,
    role_label: Option<String>,
    selected: bool,
}

pub async fn handle(ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let identity = require_profile(ctx).await?;
    let selected = ctx.session.store.selected_organization_id();

    let items = ctx.session.directory.list(&identity.id).await?;
    let rows: Vec<OrganizationRow> = items
        .into_iter()
        .map(|item| OrganizationRow {
            selected: selected.as_deref() == Some(item.id.as_str()),
            id: item.id,
            name: item.name,
            role: item.role,
            role_label: item.role_label,
        })
        .collect();

    output(&super::apply_limit(rows, flags.row_limit()), flags.format)
}
