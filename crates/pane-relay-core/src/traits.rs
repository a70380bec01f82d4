//! Collaborator traits for reading from and writing to panes.

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    keys::Keystroke,
    pane::{CaptureResult, PaneTarget},
};

/// Failure talking to the terminal multiplexer.
#[derive(Debug, Error)]
pub enum PaneError {
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("`{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
    #[error("Unexpected output: {0}")]
    InvalidOutput(String),
}

/// Read access to pane scrollback.
#[async_trait]
pub trait PaneReader: Send + Sync {
    /// Full scrollback of `target`, oldest line first.
    async fn capture_history(
        &self,
        target: &PaneTarget,
        include_color: bool,
    ) -> Result<Vec<String>, PaneError>;

    /// Last `line_count` lines of `target` (`0` for the whole buffer).
    async fn read_tail(
        &self,
        target: &PaneTarget,
        line_count: usize,
        include_color: bool,
    ) -> Result<CaptureResult, PaneError> {
        let history = self.capture_history(target, include_color).await?;
        Ok(CaptureResult::tail(history, line_count))
    }

    /// Lines `start..end` of `target`; negative indices count from the end.
    async fn read_range(
        &self,
        target: &PaneTarget,
        start: i64,
        end: i64,
        include_color: bool,
    ) -> Result<CaptureResult, PaneError> {
        let history = self.capture_history(target, include_color).await?;
        Ok(CaptureResult::range(history, start, end))
    }
}

/// Write access to pane input.
#[async_trait]
pub trait PaneWriter: Send + Sync {
    /// Type `text` literally, then press Enter.
    async fn send_line(&self, target: &PaneTarget, text: &str) -> Result<(), PaneError>;

    /// Send one keystroke without pressing Enter.
    async fn send_key(&self, target: &PaneTarget, key: &Keystroke) -> Result<(), PaneError>;
}
