use macadamy_auth::BootstrapOutcome;
use macadamy_auth::token_store::TokenSource;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::CliContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthStatusResponse {
    status: &'static str,
    user_id: Option<String>,
    email: Option<String>,
    selected_organization_id: Option<String>,
    organization: Option<String>,
    role: Option<String>,
    is_demo_user: bool,
    token_source: Option<TokenSource>,
    note: Option<String>,
}

pub async fn handle(ctx: &CliContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let outcome = ctx.session.bootstrap().await;
    let snapshot = ctx.session.store.snapshot();
    let profile = snapshot.profile.as_ref();

    let (status, note) = match &outcome {
        BootstrapOutcome::Anonymous => ("anonymous", Some("no stored session".to_string())),
        BootstrapOutcome::Authenticated { .. } => ("authenticated", None),
        BootstrapOutcome::NeedsOnboarding { .. } => (
            "needs_onboarding",
            Some("no profile exists for this account yet".to_string()),
        ),
        BootstrapOutcome::PasswordRecovery { .. } => ("password_recovery", None),
        BootstrapOutcome::Failed { error } => ("failed", Some(error.clone())),
    };

    let response = AuthStatusResponse {
        status,
        user_id: outcome.identity().map(|identity| identity.id.clone()),
        email: outcome.identity().and_then(|identity| identity.email.clone()),
        selected_organization_id: snapshot.selected_organization_id.clone(),
        organization: profile.and_then(|p| p.organization_name().map(str::to_string)),
        role: profile.and_then(|p| p.role).map(|role| role.as_str().to_string()),
        is_demo_user: profile.is_some_and(|p| p.is_demo_user),
        token_source: ctx.session.token_source(),
        note,
    };

    output(&response, flags.format)
}
