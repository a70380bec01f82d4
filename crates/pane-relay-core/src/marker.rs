//! Sentinel markers used to delimit a command's output in pane text.
//!
//! A wrapped command prints `TMUX_MCP_START_<id>` before it runs and
//! `TMUX_MCP_DONE_<id>_<status>` after it, where the shell expands the exit
//! status expression of the selected [`ShellDialect`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::record::CommandId;

/// Tag opening a command's output.
pub const START_TAG: &str = "TMUX_MCP_START";

/// Tag closing a command's output.
pub const END_TAG: &str = "TMUX_MCP_DONE";

/// Shell flavour of the panes, which decides how the exit status is spelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellDialect {
    #[default]
    Bash,
    Zsh,
    Fish,
}

impl ShellDialect {
    /// Expression that expands to the previous command's exit status.
    #[must_use]
    pub const fn exit_status_expr(self) -> &'static str {
        match self {
            Self::Fish => "$status",
            Self::Bash | Self::Zsh => "$?",
        }
    }

    /// Lowercase dialect name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }

    /// Parse a dialect name, falling back to bash for anything unknown.
    #[must_use]
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(shell = name, "Unknown shell type, falling back to bash");
            Self::Bash
        })
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown shell dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown shell type: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for ShellDialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bash" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "fish" => Ok(Self::Fish),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

/// `TMUX_MCP_START_<id>`
#[must_use]
pub fn start_marker(id: CommandId) -> String {
    format!("{START_TAG}_{id}")
}

/// `TMUX_MCP_DONE_<id>_`, the part of the end marker known before the shell runs.
#[must_use]
pub fn end_marker_prefix(id: CommandId) -> String {
    format!("{END_TAG}_{id}_")
}

/// End marker with the unexpanded exit status expression.
#[must_use]
pub fn end_marker(id: CommandId, dialect: ShellDialect) -> String {
    format!("{}{}", end_marker_prefix(id), dialect.exit_status_expr())
}

/// Wrap `command` so its output is bracketed by the markers for `id`.
///
/// The closing echo runs whatever the command's status, and reports that
/// status rather than its own.
#[must_use]
pub fn wrap_command(id: CommandId, command: &str, dialect: ShellDialect) -> String {
    format!(
        "echo \"{}\"; {command}; echo \"{}\"",
        start_marker(id),
        end_marker(id, dialect)
    )
}
