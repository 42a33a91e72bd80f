//! Terminal-dependent table preferences, detected once at startup.

use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::GlobalFlags;

/// Narrowest `COLUMNS` value honoured; below it tables are left unwrapped.
const MIN_TABLE_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiPrefs {
    pub table_color: bool,
    pub term_width: Option<usize>,
}

/// What the process knows about the terminal it writes to.
#[derive(Debug, Default)]
struct Terminal {
    stdout_is_tty: bool,
    no_color: bool,
    columns: Option<String>,
}

impl Terminal {
    fn current() -> Self {
        Self {
            stdout_is_tty: std::io::stdout().is_terminal(),
            no_color: std::env::var_os("NO_COLOR").is_some(),
            columns: std::env::var("COLUMNS").ok(),
        }
    }

    fn width(&self) -> Option<usize> {
        self.columns
            .as_deref()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|width| *width >= MIN_TABLE_WIDTH)
    }
}

static UI_PREFS: OnceLock<UiPrefs> = OnceLock::new();

fn detect(flags: &GlobalFlags, terminal: &Terminal) -> UiPrefs {
    UiPrefs {
        table_color: flags.allows_table_styling() && terminal.stdout_is_tty && !terminal.no_color,
        term_width: terminal.width(),
    }
}

/// Record the preferences for this run. Later calls keep the first value.
pub fn init(flags: &GlobalFlags) {
    let prefs = detect(flags, &Terminal::current());
    if UI_PREFS.set(prefs).is_err() {
        tracing::debug!("ui preferences already initialised");
    }
}

/// Preferences recorded by [`init`], or plain output when it never ran.
#[must_use]
pub fn prefs() -> UiPrefs {
    UI_PREFS.get().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Terminal, UiPrefs, detect};
    use crate::cli::{GlobalFlags, OutputFormat};

    fn table_flags() -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Table,
            limit: None,
            quiet: false,
            verbose: false,
        }
    }

    fn tty(columns: Option<&str>) -> Terminal {
        Terminal {
            stdout_is_tty: true,
            no_color: false,
            columns: columns.map(str::to_owned),
        }
    }

    #[test]
    fn table_on_tty_gets_color_and_width() {
        assert_eq!(
            detect(&table_flags(), &tty(Some("120"))),
            UiPrefs {
                table_color: true,
                term_width: Some(120),
            }
        );
    }

    #[test]
    fn no_color_or_pipe_disables_color() {
        let mut terminal = tty(None);
        terminal.no_color = true;
        assert!(!detect(&table_flags(), &terminal).table_color);

        let piped = Terminal::default();
        assert!(!detect(&table_flags(), &piped).table_color);
    }

    #[test]
    fn columns_below_floor_are_ignored() {
        let cases = [
            (Some("39"), None),
            (Some("40"), Some(40)),
            (Some(" 80 "), Some(80)),
            (Some("wide"), None),
            (None, None),
        ];
        for (columns, expected) in cases {
            assert_eq!(detect(&table_flags(), &tty(columns)).term_width, expected, "{columns:?}");
        }
    }
}
