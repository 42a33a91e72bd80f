use clap::{Args, Subcommand};

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password.
    Login(AuthLoginArgs),
    /// Sign in to a fresh (or reused) demo environment.
    Demo,
    /// Sign out and clear stored credentials.
    Logout,
    /// Show the resolved session.
    Status,
}

#[derive(Clone, Debug, Args)]
pub struct AuthLoginArgs {
    /// Account email.
    #[arg(long)]
    pub email: String,
    /// Password. Falls back to `MACADAMY_PASSWORD`, then one line of stdin.
    #[arg(long)]
    pub password: Option<String>,
}
