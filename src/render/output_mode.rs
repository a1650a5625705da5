//! Console output selection.

use clap::ValueEnum;
use std::fmt;

/// Requested console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Table on a terminal, log lines otherwise
    #[default]
    #[value(name = "auto")]
    Auto,
    /// Live status table
    #[value(name = "table")]
    Table,
    /// One line per notable event
    #[value(name = "log")]
    Log,
}

impl OutputMode {
    /// Resolve `Auto` against whether stdout is a terminal.
    pub fn resolve(self, is_terminal: bool) -> OutputMode {
        match self {
            OutputMode::Auto if is_terminal => OutputMode::Table,
            OutputMode::Auto => OutputMode::Log,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Auto => "auto",
            OutputMode::Table => "table",
            OutputMode::Log => "log",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
