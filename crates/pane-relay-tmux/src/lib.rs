//! tmux collaborator for pane-relay.
//!
//! Provides:
//! - `TmuxClient` - runs tmux subcommands; implements `PaneReader` and `PaneWriter`
//! - `PaneInventory` - session/window/pane discovery
//! - Executable lookup and login shell dialect detection

pub mod client;
pub mod inventory;
pub mod shell;

pub use client::{DEFAULT_COMMAND_TIMEOUT, TmuxClient};
pub use inventory::{PaneInventory, PaneListing, TmuxPane, TmuxSession, TmuxWindow};
pub use shell::{detect_shell_dialect, resolve_executable_path};
