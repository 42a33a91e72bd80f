use std::io::BufRead;

use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthLoginArgs;
use crate::context::CliContext;
use crate::output::output;

const PASSWORD_ENV: &str = "MACADAMY_PASSWORD";

#[derive(Serialize)]
struct LoginResponse {
    authenticated: bool,
    user_id: Option<String>,
    email: Option<String>,
    organization_id: Option<String>,
    organization: Option<String>,
    notices: Vec<String>,
}

pub async fn handle(args: &AuthLoginArgs, ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let password = resolve_password(args.password.as_deref())?;

    let result = ctx.session.sessions.login(&args.email, &password).await;
    let response = match &result {
        Ok(profile) => LoginResponse {
            authenticated: true,
            user_id: Some(profile.id.clone()),
            email: Some(profile.email.clone()),
            organization_id: ctx.session.store.selected_organization_id(),
            organization: profile.organization_name().map(str::to_string),
            notices: ctx.drain_notices(),
        },
        Err(_) => LoginResponse {
            authenticated: ctx.session.store.snapshot().is_signed_in(),
            user_id: ctx.session.store.identity().map(|identity| identity.id),
            email: None,
            organization_id: None,
            organization: None,
            notices: ctx.drain_notices(),
        },
    };

    output(&response, flags.format)?;
    result.map(|_| ()).map_err(anyhow::Error::from)
}

fn resolve_password(explicit: Option<&str>) -> anyhow::Result<String> {
    if let Some(password) = explicit {
        return Ok(password.to_string());
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV)
        && !password.is_empty()
    {
        return Ok(password);
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("no password given; pass --password, set {PASSWORD_ENV} or pipe it on stdin");
    }
    Ok(password)
}
