//! Payload construction for injected commands.

use pane_relay_core::{
    CommandId, CommandMode, Keystroke, NamedKey, PaneTarget, ShellDialect, marker::wrap_command,
};

/// A command to inject into a pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectRequest {
    pub pane: PaneTarget,
    pub command: String,
    pub mode: CommandMode,
    /// Press Enter after the payload. When false the payload is sent as
    /// individual keystrokes.
    pub send_enter: bool,
}

impl InjectRequest {
    /// Normal-mode request that is submitted with Enter.
    #[must_use]
    pub fn new<P: Into<PaneTarget>, S: Into<String>>(pane: P, command: S) -> Self {
        Self {
            pane: pane.into(),
            command: command.into(),
            mode: CommandMode::Normal,
            send_enter: true,
        }
    }

    /// Send the command unwrapped and do not track completion.
    #[must_use]
    pub const fn raw(mut self) -> Self {
        self.mode = CommandMode::Raw;
        self
    }

    /// Send keystrokes without a trailing Enter.
    #[must_use]
    pub const fn no_enter(mut self) -> Self {
        self.send_enter = false;
        self
    }

    /// Mode the record is tracked under.
    ///
    /// Keystroke input is never wrapped, so it is always raw.
    #[must_use]
    pub const fn effective_mode(&self) -> CommandMode {
        if self.send_enter {
            self.mode
        } else {
            CommandMode::Raw
        }
    }
}

/// What is actually sent to the pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transmission {
    /// One literal line followed by Enter.
    Line(String),
    /// Ordered keystrokes with no Enter appended.
    Keys(Vec<Keystroke>),
}

/// Build the transmission for `request` registered under `id`.
#[must_use]
pub fn build_transmission(
    id: CommandId,
    request: &InjectRequest,
    dialect: ShellDialect,
) -> Transmission {
    if !request.send_enter {
        return Transmission::Keys(segment_keystrokes(&request.command));
    }
    match request.mode {
        CommandMode::Normal => Transmission::Line(wrap_command(id, &request.command, dialect)),
        CommandMode::Raw => Transmission::Line(request.command.clone()),
    }
}

/// Split keystroke-mode input into key events.
///
/// A payload that is exactly a key name (`Escape`, `F5`, ...) becomes that
/// single key; anything else is typed one character at a time.
#[must_use]
pub fn segment_keystrokes(payload: &str) -> Vec<Keystroke> {
    payload.parse::<NamedKey>().map_or_else(
        |_| payload.chars().map(Keystroke::Char).collect(),
        |key| vec![Keystroke::Named(key)],
    )
}

/// Escape `'` for inclusion inside a single-quoted shell word.
#[must_use]
pub fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', r"'\''")
}
