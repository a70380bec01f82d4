//! Registry of submitted commands and their completion state.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use thiserror::Error;

use crate::{
    detect::detect_completion,
    record::{self, CommandId, CommandMode, CommandRecord},
    traits::{PaneError, PaneReader},
};

/// Lines read from the end of the pane when looking for markers.
pub const DEFAULT_TAIL_LINES: usize = 1000;

/// Tracker error.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Command not found: {0}")]
    NotFound(CommandId),
    #[error("Duplicate command id: {0}")]
    DuplicateId(CommandId),
    #[error("Pane error: {0}")]
    Pane(#[from] PaneError),
    #[error("Tracker error: {0}")]
    Internal(String),
}

/// Command registry with refresh and eviction.
///
/// Records are guarded by one lock that is never held across a pane read:
/// a refresh snapshots the record, reads the pane, then re-locks to fold in
/// what it saw. Folding is monotonic, so concurrent refreshes of the same id
/// converge on the same terminal state.
pub struct CommandTracker {
    reader: Arc<dyn PaneReader>,
    records: RwLock<HashMap<CommandId, CommandRecord>>,
    tail_lines: usize,
}

impl CommandTracker {
    /// Create a tracker reading [`DEFAULT_TAIL_LINES`] per refresh.
    #[must_use]
    pub fn new(reader: Arc<dyn PaneReader>) -> Self {
        Self::with_tail_lines(reader, DEFAULT_TAIL_LINES)
    }

    /// Create a tracker with a custom tail window.
    ///
    /// Commands whose output plus both markers exceed the window stay
    /// pending; raise the window to track them.
    #[must_use]
    pub fn with_tail_lines(reader: Arc<dyn PaneReader>, tail_lines: usize) -> Self {
        Self {
            reader,
            records: RwLock::new(HashMap::new()),
            tail_lines,
        }
    }

    /// Insert a new record.
    ///
    /// # Errors
    /// Returns `DuplicateId` if the id is already registered.
    pub fn register(&self, record: CommandRecord) -> Result<(), TrackerError> {
        let mut records = self.write()?;
        let id = record.id();
        if records.contains_key(&id) {
            tracing::error!(command_id = %id, "Command id collision");
            return Err(TrackerError::DuplicateId(id));
        }
        tracing::debug!(
            command_id = %id,
            pane = %record.pane(),
            mode = ?record.mode(),
            "Registered command"
        );
        records.insert(id, record);
        Ok(())
    }

    /// Re-read the pane and update the record's status.
    ///
    /// Terminal records are returned as stored. Raw records never touch the
    /// pane. A failed pane read leaves the stored record unchanged.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids and `Pane` if the read fails.
    pub async fn refresh(&self, id: CommandId) -> Result<CommandRecord, TrackerError> {
        let snapshot = self.get(id)?;
        if snapshot.status().is_terminal() {
            return Ok(snapshot);
        }
        if snapshot.mode() == CommandMode::Raw {
            return self.update(id, CommandRecord::mark_untracked);
        }

        let capture = self
            .reader
            .read_tail(snapshot.pane(), self.tail_lines, false)
            .await?;
        let completion = detect_completion(&capture.content(), id);
        tracing::debug!(command_id = %id, ?completion, "Refreshed command");

        let updated = self.update(id, |record| record.apply(completion))?;
        if updated.status().is_terminal() {
            tracing::info!(
                command_id = %id,
                status = %updated.status(),
                exit_code = ?updated.exit_code(),
                "Command finished"
            );
        }
        Ok(updated)
    }

    /// Stored record, without reading the pane.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids.
    pub fn get(&self, id: CommandId) -> Result<CommandRecord, TrackerError> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(TrackerError::NotFound(id))
    }

    /// Ids of every record currently held.
    ///
    /// # Errors
    /// Returns `Internal` if the registry lock is poisoned.
    pub fn live_ids(&self) -> Result<Vec<CommandId>, TrackerError> {
        Ok(self.read()?.keys().copied().collect())
    }

    /// Snapshot of every record, oldest first.
    ///
    /// # Errors
    /// Returns `Internal` if the registry lock is poisoned.
    pub fn records(&self) -> Result<Vec<CommandRecord>, TrackerError> {
        let mut records: Vec<CommandRecord> = self.read()?.values().cloned().collect();
        records.sort_by_key(CommandRecord::started_at_secs);
        Ok(records)
    }

    /// Remove finished records older than `max_age_minutes`.
    ///
    /// Pending records are kept whatever their age. Returns how many were removed.
    ///
    /// # Errors
    /// Returns `Internal` if the registry lock is poisoned.
    pub fn evict(&self, max_age_minutes: u64) -> Result<usize, TrackerError> {
        self.evict_at(max_age_minutes, record::now())
    }

    /// [`Self::evict`] measured against an explicit clock (Unix epoch seconds).
    ///
    /// # Errors
    /// Returns `Internal` if the registry lock is poisoned.
    pub fn evict_at(&self, max_age_minutes: u64, now: i64) -> Result<usize, TrackerError> {
        let max_age_secs = i64::try_from(max_age_minutes.saturating_mul(60)).unwrap_or(i64::MAX);
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|_, record| {
            !(record.status().is_terminal() && record.age_secs(now) > max_age_secs)
        });
        let removed = before - records.len();
        if removed > 0 {
            tracing::info!(removed, max_age_minutes, "Evicted finished commands");
        }
        Ok(removed)
    }

    fn update(
        &self,
        id: CommandId,
        apply: impl FnOnce(&mut CommandRecord),
    ) -> Result<CommandRecord, TrackerError> {
        let mut records = self.write()?;
        let record = records.get_mut(&id).ok_or(TrackerError::NotFound(id))?;
        apply(record);
        Ok(record.clone())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<CommandId, CommandRecord>>, TrackerError> {
        self.records
            .read()
            .map_err(|e| TrackerError::Internal(e.to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<CommandId, CommandRecord>>, TrackerError> {
        self.records
            .write()
            .map_err(|e| TrackerError::Internal(e.to_string()))
    }
}
