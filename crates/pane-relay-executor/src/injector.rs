//! Command injector: registers a record, then transmits its payload.

use std::sync::Arc;

use pane_relay_core::{
    CommandId, CommandRecord, CommandTracker, PaneError, PaneWriter, ShellDialect, TrackerError,
};
use thiserror::Error;
use uuid::Uuid;

use crate::payload::{InjectRequest, Transmission, build_transmission};

/// Injection error.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
    /// The record was registered but the pane rejected the input. The record
    /// stays pending and may be polled or evicted.
    #[error("Failed to send command {id}: {source}")]
    Transmission {
        id: CommandId,
        #[source]
        source: PaneError,
    },
}

/// Sends commands into panes and registers them for tracking.
pub struct CommandInjector {
    tracker: Arc<CommandTracker>,
    writer: Arc<dyn PaneWriter>,
    dialect: ShellDialect,
}

impl CommandInjector {
    /// Create an injector wrapping commands for `dialect`.
    #[must_use]
    pub fn new(
        tracker: Arc<CommandTracker>,
        writer: Arc<dyn PaneWriter>,
        dialect: ShellDialect,
    ) -> Self {
        Self {
            tracker,
            writer,
            dialect,
        }
    }

    /// Dialect used for end markers.
    #[must_use]
    pub const fn dialect(&self) -> ShellDialect {
        self.dialect
    }

    /// Tracker records are registered with.
    #[must_use]
    pub fn tracker(&self) -> &Arc<CommandTracker> {
        &self.tracker
    }

    /// Register `request` and send it to its pane.
    ///
    /// The record is visible to the tracker before any input reaches the
    /// pane, so a fast command cannot finish before it is known.
    ///
    /// # Errors
    /// Returns `Tracker` if registration fails and `Transmission` if the pane
    /// rejects the input.
    pub async fn inject(&self, request: InjectRequest) -> Result<CommandId, InjectError> {
        let id = Uuid::new_v4();
        let mode = request.effective_mode();
        self.tracker.register(CommandRecord::new(
            id,
            request.pane.clone(),
            request.command.clone(),
            mode,
        ))?;

        let transmission = build_transmission(id, &request, self.dialect);
        self.transmit(&request, &transmission)
            .await
            .map_err(|source| {
                tracing::warn!(
                    command_id = %id,
                    pane = %request.pane,
                    error = %source,
                    "Failed to send command"
                );
                InjectError::Transmission { id, source }
            })?;

        tracing::info!(command_id = %id, pane = %request.pane, ?mode, "Injected command");
        Ok(id)
    }

    async fn transmit(
        &self,
        request: &InjectRequest,
        transmission: &Transmission,
    ) -> Result<(), PaneError> {
        match transmission {
            Transmission::Line(line) => self.writer.send_line(&request.pane, line).await,
            Transmission::Keys(keys) => {
                for key in keys {
                    self.writer.send_key(&request.pane, key).await?;
                }
                Ok(())
            }
        }
    }
}
