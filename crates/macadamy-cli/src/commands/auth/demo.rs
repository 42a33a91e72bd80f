use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::CliContext;
use crate::output::output;

#[derive(Serialize)]
struct DemoLoginResponse {
    authenticated: bool,
    user_id: Option<String>,
    session_id: Option<String>,
    organization_id: Option<String>,
    notices: Vec<String>,
}

pub async fn handle(ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let result = ctx.session.sessions.login_as_demo_user().await;
    let response = match &result {
        Ok(profile) => DemoLoginResponse {
            authenticated: true,
            user_id: Some(profile.id.clone()),
            session_id: profile.session_id.clone(),
            organization_id: ctx.session.store.selected_organization_id(),
            notices: ctx.drain_notices(),
        },
        Err(_) => DemoLoginResponse {
            authenticated: false,
            user_id: None,
            session_id: None,
            organization_id: None,
            notices: ctx.drain_notices(),
        },
    };

    output(&response, flags.format)?;
    result.map(|_| ()).map_err(anyhow::Error::from)
}
