//! Core building blocks for driving shell commands through terminal panes.
//!
//! This crate provides:
//! - `PaneTarget` / `CaptureResult` - pane addressing and scrollback slicing
//! - Marker protocol and `ShellDialect`
//! - `detect_completion` - pure scan of pane text for a command's markers
//! - `CommandRecord` - state of one submitted command
//! - `PaneReader` / `PaneWriter` traits for the multiplexer collaborator
//! - `CommandTracker` - registry with refresh and eviction

pub mod detect;
pub mod keys;
pub mod marker;
pub mod pane;
pub mod record;
pub mod tracker;
pub mod traits;

pub use detect::{Completion, detect_completion};
pub use keys::{Keystroke, NamedKey};
pub use marker::ShellDialect;
pub use pane::{CaptureResult, PaneTarget};
pub use record::{CommandId, CommandMode, CommandRecord, CommandStatus};
pub use tracker::{CommandTracker, TrackerError};
pub use traits::{PaneError, PaneReader, PaneWriter};
