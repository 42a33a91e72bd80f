use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `mcd` binary.
#[derive(Debug, Parser)]
#[command(name = "mcd", version, about = "Macadamy - session and organization toolbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::subcommands::{AuthCommands, OrgCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "mcd", "--format", "table", "--limit", "10", "--verbose", "org", "list",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Org {
                action: OrgCommands::List
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["mcd", "auth", "status", "--format", "raw", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Auth {
                action: AuthCommands::Status
            }
        ));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["mcd", "--format", "xml", "auth", "status"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn switch_requires_organization_id() {
        assert!(Cli::try_parse_from(["mcd", "org", "switch"]).is_err());

        let cli = Cli::try_parse_from(["mcd", "org", "switch", "org-42"]).expect("cli should parse");
        let Commands::Org {
            action: OrgCommands::Switch(args),
        } = cli.command
        else {
            panic!("expected org switch");
        };
        assert_eq!(args.organization_id, "org-42");
    }

    #[test]
    fn login_accepts_email_and_optional_password() {
        let cli = Cli::try_parse_from(["mcd", "auth", "login", "--email", "ana@example.com"])
            .expect("cli should parse");
        let Commands::Auth {
            action: AuthCommands::Login(args),
        } = cli.command
        else {
            panic!("expected auth login");
        };
        assert_eq!(args.email, "ana@example.com");
        assert_eq!(args.password, None);
    }

    #[test]
    fn login_requires_email() {
        assert!(Cli::try_parse_from(["mcd", "auth", "login"]).is_err());
    }
}
