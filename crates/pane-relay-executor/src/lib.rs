//! Command injection into terminal panes.
//!
//! Provides:
//! - `InjectRequest` / `Transmission` - payload construction (wrapped, raw or keystrokes)
//! - `CommandInjector` - register-then-send over a `PaneWriter`

pub mod injector;
pub mod payload;

pub use injector::{CommandInjector, InjectError};
pub use payload::{
    InjectRequest, Transmission, build_transmission, escape_single_quotes, segment_keystrokes,
};
