//! Command manager for submitting and following commands in panes.

use std::{sync::Arc, time::Duration};

use pane_relay_core::{
    CaptureResult, CommandId, CommandMode, CommandRecord, CommandStatus, CommandTracker,
    PaneError, PaneReader, PaneTarget, TrackerError,
};
use pane_relay_executor::{CommandInjector, InjectError, InjectRequest};
use serde::Serialize;
use tokio::time::Instant;

/// Stand-in deadline for waits too long to represent as an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Command manager error.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error("Inject error: {0}")]
    Inject(#[from] InjectError),
    #[error("Pane error: {0}")]
    Pane(#[from] PaneError),
}

/// Tunables for polling and enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Delay between pane reads while waiting.
    pub poll_interval: Duration,
    /// Wait applied when a caller does not give one.
    pub default_timeout: Duration,
    /// Finished records older than this are dropped before listing.
    pub listing_max_age_minutes: u64,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            default_timeout: Duration::from_secs(15),
            listing_max_age_minutes: 10,
        }
    }
}

/// Result of waiting on a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    pub record: CommandRecord,
    /// The deadline passed before the command finished.
    pub timed_out: bool,
}

/// One entry of a command listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSummary {
    pub id: CommandId,
    pub summary: String,
    pub status: CommandStatus,
}

impl From<&CommandRecord> for CommandSummary {
    fn from(record: &CommandRecord) -> Self {
        Self {
            id: record.id(),
            summary: record.summary(),
            status: record.status(),
        }
    }
}

/// Which part of a pane's scrollback to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSpan {
    /// Last `n` lines; `0` for the whole buffer.
    Tail(usize),
    /// Lines `start..end`; negative indices count from the end.
    Range { start: i64, end: i64 },
}

/// Caller-facing facade over the injector and tracker.
pub struct CommandManager {
    injector: CommandInjector,
    tracker: Arc<CommandTracker>,
    reader: Arc<dyn PaneReader>,
    settings: ManagerSettings,
}

impl CommandManager {
    /// Create a manager. `reader` serves capture requests; the injector's
    /// tracker holds the records.
    #[must_use]
    pub fn new(
        injector: CommandInjector,
        reader: Arc<dyn PaneReader>,
        settings: ManagerSettings,
    ) -> Self {
        let tracker = Arc::clone(injector.tracker());
        Self {
            injector,
            tracker,
            reader,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    #[must_use]
    pub fn tracker(&self) -> &Arc<CommandTracker> {
        &self.tracker
    }

    /// Send a command and return its id without waiting.
    ///
    /// # Errors
    /// Returns `Inject` if registration or transmission fails.
    pub async fn submit(&self, request: InjectRequest) -> Result<CommandId, ManagerError> {
        Ok(self.injector.inject(request).await?)
    }

    /// Send a command and, unless it is raw, wait for it to finish.
    ///
    /// `timeout` defaults to [`ManagerSettings::default_timeout`].
    ///
    /// # Errors
    /// Returns `Inject` if sending fails and `Tracker` if a pane read fails
    /// while waiting.
    pub async fn execute(
        &self,
        request: InjectRequest,
        timeout: Option<Duration>,
    ) -> Result<PollOutcome, ManagerError> {
        let id = self.submit(request).await?;
        self.wait(id, timeout.unwrap_or(self.settings.default_timeout))
            .await
    }

    /// Poll `id` until it finishes or `timeout` elapses.
    ///
    /// Raw records return at once with their untracked notice. On timeout the
    /// last refreshed record is returned with `timed_out` set.
    ///
    /// # Errors
    /// Returns `Tracker` for unknown ids or failed pane reads.
    pub async fn wait(
        &self,
        id: CommandId,
        timeout: Duration,
    ) -> Result<PollOutcome, ManagerError> {
        let started = Instant::now();
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        loop {
            let record = self.tracker.refresh(id).await?;
            if record.status().is_terminal() || record.mode() == CommandMode::Raw {
                return Ok(PollOutcome {
                    record,
                    timed_out: false,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::info!(
                    command_id = %id,
                    timeout_secs = timeout.as_secs(),
                    "Timed out waiting for command"
                );
                return Ok(PollOutcome {
                    record,
                    timed_out: true,
                });
            }
            tokio::time::sleep(self.settings.poll_interval.min(deadline - now)).await;
        }
    }

    /// Stored record without reading the pane.
    ///
    /// # Errors
    /// Returns `Tracker` for unknown ids.
    pub fn fetch(&self, id: CommandId) -> Result<CommandRecord, ManagerError> {
        Ok(self.tracker.get(id)?)
    }

    /// Record after one pane read.
    ///
    /// # Errors
    /// Returns `Tracker` for unknown ids or failed pane reads.
    pub async fn refresh(&self, id: CommandId) -> Result<CommandRecord, ManagerError> {
        Ok(self.tracker.refresh(id).await?)
    }

    /// Ids currently held.
    ///
    /// # Errors
    /// Returns `Tracker` if the registry is unavailable.
    pub fn live_ids(&self) -> Result<Vec<CommandId>, ManagerError> {
        Ok(self.tracker.live_ids()?)
    }

    /// Summaries of held commands, oldest first, after dropping stale
    /// finished ones.
    ///
    /// # Errors
    /// Returns `Tracker` if the registry is unavailable.
    pub fn list(&self) -> Result<Vec<CommandSummary>, ManagerError> {
        self.sweep(self.settings.listing_max_age_minutes)?;
        Ok(self
            .tracker
            .records()?
            .iter()
            .map(CommandSummary::from)
            .collect())
    }

    /// Drop finished commands older than `max_age_minutes`.
    ///
    /// # Errors
    /// Returns `Tracker` if the registry is unavailable.
    pub fn sweep(&self, max_age_minutes: u64) -> Result<usize, ManagerError> {
        Ok(self.tracker.evict(max_age_minutes)?)
    }

    /// Read part of a pane's scrollback.
    ///
    /// # Errors
    /// Returns `Pane` if the read fails.
    pub async fn capture(
        &self,
        pane: &PaneTarget,
        span: CaptureSpan,
        include_color: bool,
    ) -> Result<CaptureResult, ManagerError> {
        let capture = match span {
            CaptureSpan::Tail(lines) => self.reader.read_tail(pane, lines, include_color).await?,
            CaptureSpan::Range { start, end } => {
                self.reader
                    .read_range(pane, start, end, include_color)
                    .await?
            }
        };
        tracing::debug!(%pane, ?span, lines = capture.lines.len(), "Captured pane");
        Ok(capture)
    }
}
