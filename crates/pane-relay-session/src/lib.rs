//! Caller-facing command management for terminal panes.
//!
//! Provides:
//! - `CommandManager` - submit, wait, list, sweep and capture
//! - `spawn_janitor` - periodic eviction of finished commands

#[cfg(test)]
mod fake;
pub mod janitor;
pub mod manager;

pub use janitor::spawn_janitor;
pub use manager::{
    CaptureSpan, CommandManager, CommandSummary, ManagerError, ManagerSettings, PollOutcome,
};
