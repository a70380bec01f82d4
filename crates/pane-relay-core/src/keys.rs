//! Keystroke events accepted by a pane.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Control keys that are sent by name rather than as literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Up,
    Down,
    Left,
    Right,
    Escape,
    Tab,
    Enter,
    Space,
    BSpace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function key `F1`..`F12`.
    F(u8),
}

impl NamedKey {
    /// Key name as the multiplexer spells it.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        }
    }
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Returned when text is not one of the named keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotANamedKey;

impl FromStr for NamedKey {
    type Err = NotANamedKey;

    /// Exact, case-sensitive match: `"Escape"` is a key, `"escape"` is text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "Up" => Self::Up,
            "Down" => Self::Down,
            "Left" => Self::Left,
            "Right" => Self::Right,
            "Escape" => Self::Escape,
            "Tab" => Self::Tab,
            "Enter" => Self::Enter,
            "Space" => Self::Space,
            "BSpace" => Self::BSpace,
            "Delete" => Self::Delete,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            _ => {
                let n = s
                    .strip_prefix('F')
                    .filter(|digits| !digits.starts_with('0'))
                    .and_then(|digits| digits.parse::<u8>().ok())
                    .ok_or(NotANamedKey)?;
                if !(1..=12).contains(&n) {
                    return Err(NotANamedKey);
                }
                Self::F(n)
            }
        };
        Ok(key)
    }
}

/// One keystroke event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keystroke {
    /// A control key sent by name.
    Named(NamedKey),
    /// A single literal character.
    Char(char),
}
