//! Tracked command records.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{detect::Completion, pane::PaneTarget};

/// Command identifier.
pub type CommandId = Uuid;

/// Message attached to raw/interactive records, which are never tracked.
pub const UNTRACKED_MESSAGE: &str =
    "Status tracking unavailable for rawMode commands. \
     Use capture-pane to monitor interactive apps instead.";

/// Message attached while the sentinels cannot both be found.
pub const INCOMPLETE_MESSAGE: &str = "Command output could not be captured properly";

/// Longest command prefix shown in summaries.
const SUMMARY_CHARS: usize = 30;

/// How a command was sent to its pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMode {
    /// Wrapped in sentinels and tracked to completion.
    Normal,
    /// Sent unmodified; completion is never observed.
    Raw,
}

/// Command status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// Not yet observed to finish.
    Pending,
    /// Finished with exit code zero.
    Completed,
    /// Finished with a non-zero exit code.
    Error,
}

impl CommandStatus {
    /// Whether the status can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command submitted to a pane.
///
/// Identity fields are fixed at creation. Status, exit code and result only
/// move forward through [`CommandRecord::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    id: CommandId,
    pane: PaneTarget,
    command: String,
    mode: CommandMode,
    status: CommandStatus,
    /// Creation time, Unix epoch seconds.
    started_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
}

impl CommandRecord {
    /// Create a pending record stamped with the current time.
    #[must_use]
    pub fn new(
        id: CommandId,
        pane: PaneTarget,
        command: impl Into<String>,
        mode: CommandMode,
    ) -> Self {
        Self::started_at(id, pane, command, mode, now())
    }

    /// Create a pending record with an explicit start time.
    #[must_use]
    pub fn started_at(
        id: CommandId,
        pane: PaneTarget,
        command: impl Into<String>,
        mode: CommandMode,
        started_at: i64,
    ) -> Self {
        Self {
            id,
            pane,
            command: command.into(),
            mode,
            status: CommandStatus::Pending,
            started_at,
            result: None,
            exit_code: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> CommandId {
        self.id
    }

    #[must_use]
    pub const fn pane(&self) -> &PaneTarget {
        &self.pane
    }

    /// The command as submitted, before wrapping.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub const fn mode(&self) -> CommandMode {
        self.mode
    }

    #[must_use]
    pub const fn status(&self) -> CommandStatus {
        self.status
    }

    /// Creation time, Unix epoch seconds.
    #[must_use]
    pub const fn started_at_secs(&self) -> i64 {
        self.started_at
    }

    /// Extracted output, or an informational message while pending.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Exit code; present iff the status is terminal.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Age in seconds relative to `now` (Unix epoch seconds).
    #[must_use]
    pub const fn age_secs(&self, now: i64) -> i64 {
        now.saturating_sub(self.started_at)
    }

    /// Fold a completion observation into the record.
    ///
    /// Terminal records are left untouched, so repeated or concurrent
    /// observations never move a record back to pending.
    pub fn apply(&mut self, completion: Completion) {
        if self.status.is_terminal() {
            return;
        }
        match completion {
            Completion::Pending => {
                self.result = Some(INCOMPLETE_MESSAGE.to_string());
            }
            Completion::Completed { exit_code, output } => {
                self.finish(CommandStatus::Completed, exit_code, output);
            }
            Completion::Error { exit_code, output } => {
                self.finish(CommandStatus::Error, exit_code, output);
            }
        }
    }

    /// Attach the explanation given for raw/interactive records.
    pub fn mark_untracked(&mut self) {
        if self.status == CommandStatus::Pending {
            self.result = Some(UNTRACKED_MESSAGE.to_string());
        }
    }

    /// Command text cut to a short label for listings.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut chars = self.command.chars();
        let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    fn finish(&mut self, status: CommandStatus, exit_code: i32, output: String) {
        self.status = status;
        self.exit_code = Some(exit_code);
        self.result = Some(output);
    }
}

/// Current time as Unix epoch seconds.
#[must_use]
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
