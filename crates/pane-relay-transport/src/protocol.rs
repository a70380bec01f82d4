//! Wire protocol and text renderings for command clients.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use pane_relay_core::{CaptureResult, CommandId, CommandRecord, CommandStatus, PaneTarget};
use pane_relay_executor::InjectRequest;
use pane_relay_session::CaptureSpan;
use serde::{Deserialize, Serialize};

/// Lines returned by a capture request that does not say how many.
pub const DEFAULT_CAPTURE_LINES: usize = 100;

/// Lines returned by `GET /panes/{pane}`.
pub const PANE_CONTENT_LINES: usize = 200;

const NO_CONTENT: &str = "No content captured";

/// Body of `POST /commands`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub pane: String,
    pub command: String,
    /// Send unwrapped and skip completion tracking.
    #[serde(default)]
    pub raw_mode: bool,
    /// Send keystrokes without Enter. Implies `raw_mode`.
    #[serde(default)]
    pub no_enter: bool,
    /// Seconds to wait for completion; `0` returns at once.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl SubmitRequest {
    /// Whether the command will be tracked.
    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        !(self.raw_mode || self.no_enter)
    }

    /// Requested wait, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl From<&SubmitRequest> for InjectRequest {
    fn from(request: &SubmitRequest) -> Self {
        let mut inject = Self::new(request.pane.as_str(), request.command.as_str());
        if request.raw_mode {
            inject = inject.raw();
        }
        if request.no_enter {
            inject = inject.no_enter();
        }
        inject
    }
}

/// Response to `POST /commands`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: CommandId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<CommandRecord>,
    pub timed_out: bool,
    pub text: String,
}

/// Query of `GET /commands/{id}`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FetchQuery {
    /// Read the pane before answering. Defaults to true.
    pub refresh: Option<bool>,
}

/// A record with its human-readable rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandView {
    pub record: CommandRecord,
    pub text: String,
}

impl From<CommandRecord> for CommandView {
    fn from(record: CommandRecord) -> Self {
        let text = render_record(&record);
        Self { record, text }
    }
}

/// Query of `DELETE /commands`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SweepQuery {
    pub max_age_minutes: Option<u64>,
}

/// Response to `DELETE /commands`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SweepResponse {
    pub removed: usize,
}

/// Query of `GET /panes/{pane}/capture`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CaptureQuery {
    pub lines: Option<usize>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(default)]
    pub colors: bool,
}

impl CaptureQuery {
    /// Range when both bounds are given, otherwise a tail.
    ///
    /// # Errors
    /// Returns a message when only one bound is given.
    pub fn span(&self) -> Result<CaptureSpan, String> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(CaptureSpan::Range { start, end }),
            (None, None) => Ok(CaptureSpan::Tail(
                self.lines.unwrap_or(DEFAULT_CAPTURE_LINES),
            )),
            _ => Err("start and end must be given together".to_string()),
        }
    }
}

/// Response to a capture request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub pane: PaneTarget,
    #[serde(flatten)]
    pub capture: CaptureResult,
    pub text: String,
}

/// Response to `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Text for a record as it stands.
#[must_use]
pub fn render_record(record: &CommandRecord) -> String {
    match (record.status(), record.result()) {
        (CommandStatus::Pending, Some(message)) => format!(
            "Status: {}\nCommand: {}\n\n--- Message ---\n{message}",
            record.status(),
            record.command()
        ),
        (CommandStatus::Pending, None) => format!(
            "Command still executing...\nStarted: {}\nCommand: {}",
            format_start(record),
            record.command()
        ),
        _ => render_terminal(record),
    }
}

/// Text for a command that finished while the caller waited.
#[must_use]
pub fn render_finished(record: &CommandRecord) -> String {
    format!("Command ID: {}\n{}", record.id(), render_terminal(record))
}

/// Text for a wait that hit its deadline.
#[must_use]
pub fn render_timeout(record: &CommandRecord) -> String {
    format!(
        "Timeout reached. Command ID: {}\nCurrent status: {}\n\n--- Output ---\n{}. \
         Command is still running; fetch /commands/{} for the result.",
        record.id(),
        record.status(),
        record.result().unwrap_or("No output yet."),
        record.id()
    )
}

/// Text for a raw or keystroke submission.
#[must_use]
pub fn render_untracked(id: CommandId, pane: &str, keystrokes: bool) -> String {
    let mode = if keystrokes {
        "Keys sent without Enter"
    } else {
        "Interactive command started (rawMode)"
    };
    format!(
        "{mode}.\n\nStatus tracking is disabled.\n\
         Capture pane '{pane}' to verify the command outcome.\n\nCommand ID: {id}"
    )
}

/// Text for a submission that was not waited on.
#[must_use]
pub fn render_started(id: CommandId) -> String {
    format!(
        "Command execution started with ID: {id}\n\nFetch /commands/{id} for the result.\n\n\
         Status will change from 'pending' to 'completed' or 'error' when finished."
    )
}

/// Text for a pane capture.
#[must_use]
pub fn render_capture(capture: &CaptureResult) -> String {
    if capture.is_blank() {
        return NO_CONTENT.to_string();
    }
    format!(
        "Captured lines {}-{} of {}:\n\n{}",
        capture.start_line,
        capture.end_line,
        capture.total_lines,
        capture.content()
    )
}

/// Bare content of a pane read, without the line header.
#[must_use]
pub fn render_pane_content(capture: &CaptureResult) -> String {
    if capture.is_blank() {
        NO_CONTENT.to_string()
    } else {
        capture.content()
    }
}

fn render_terminal(record: &CommandRecord) -> String {
    let exit_code = record
        .exit_code()
        .map_or_else(|| "unknown".to_string(), |code| code.to_string());
    format!(
        "Status: {}\nExit code: {exit_code}\nCommand: {}\n\n--- Output ---\n{}",
        record.status(),
        record.command(),
        record.result().unwrap_or_default()
    )
}

/// Start time as ISO-8601 UTC with milliseconds.
fn format_start(record: &CommandRecord) -> String {
    DateTime::from_timestamp(record.started_at_secs(), 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
