use clap::ValueEnum;

/// How command results are printed to stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON, the default for scripting.
    #[default]
    Json,
    /// Column-aligned table sized to the terminal.
    Table,
    /// Single-line JSON.
    Raw,
}

/// Flags shared by every `mcd` command, resolved once from [`super::Cli`].
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    /// Cap on the rows printed by listing commands.
    pub limit: Option<u32>,
    pub quiet: bool,
    pub verbose: bool,
}

impl GlobalFlags {
    /// `--limit` as a row count; `None` prints every row.
    #[must_use]
    pub fn row_limit(&self) -> Option<usize> {
        self.limit.and_then(|limit| usize::try_from(limit).ok())
    }

    /// Whether table output may use ANSI styling before the terminal is
    /// consulted.
    #[must_use]
    pub fn allows_table_styling(&self) -> bool {
        self.format == OutputFormat::Table && !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{GlobalFlags, OutputFormat};

    fn flags(format: OutputFormat, limit: Option<u32>, quiet: bool) -> GlobalFlags {
        GlobalFlags {
            format,
            limit,
            quiet,
            verbose: false,
        }
    }

    #[test]
    fn row_limit_converts_flag() {
        assert_eq!(flags(OutputFormat::Json, Some(3), false).row_limit(), Some(3));
        assert_eq!(flags(OutputFormat::Json, None, false).row_limit(), None);
    }

    #[test]
    fn styling_needs_table_format_and_not_quiet() {
        assert!(flags(OutputFormat::Table, None, false).allows_table_styling());
        assert!(!flags(OutputFormat::Table, None, true).allows_table_styling());
        assert!(!flags(OutputFormat::Raw, None, false).allows_table_styling());
    }
}
