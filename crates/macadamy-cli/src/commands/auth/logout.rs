use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::CliContext;
use crate::output::output;

#[derive(Serialize)]
struct LogoutResponse {
    logged_out: bool,
    notices: Vec<String>,
}

pub async fn handle(ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let result = ctx.session.sessions.logout().await;
    output(
        &LogoutResponse {
            logged_out: result.is_ok(),
            notices: ctx.drain_notices(),
        },
        flags.format,
    )?;
    result.map_err(anyhow::Error::from)
}
