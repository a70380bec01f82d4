//! Pane addressing and scrollback slicing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a destination pane (`%3`, `work:1.0`, ...).
///
/// Never validated here; the pane collaborator reports unknown targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneTarget(String);

impl PaneTarget {
    /// Create a pane target.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    /// Borrow the raw target string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaneTarget {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PaneTarget {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lines read from a pane, with their position in the full scrollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Captured lines, oldest first.
    pub lines: Vec<String>,
    /// Absolute index of the first captured line.
    pub start_line: usize,
    /// Absolute index one past the last captured line.
    pub end_line: usize,
    /// Number of lines in the full scrollback.
    pub total_lines: usize,
}

impl CaptureResult {
    /// Keep the last `count` lines of `history`. A count of `0` keeps everything.
    #[must_use]
    pub fn tail(mut history: Vec<String>, count: usize) -> Self {
        let total_lines = history.len();
        let start_line = if count == 0 {
            0
        } else {
            total_lines.saturating_sub(count)
        };
        let lines = history.split_off(start_line);
        Self {
            lines,
            start_line,
            end_line: total_lines,
            total_lines,
        }
    }

    /// Slice `history` by line indices.
    ///
    /// Negative indices count back from the end of the scrollback. Indices
    /// are clamped to the buffer; an inverted range yields no lines.
    #[must_use]
    pub fn range(history: Vec<String>, start: i64, end: i64) -> Self {
        let total_lines = history.len();
        let start_line = resolve_index(start, total_lines);
        let end_line = resolve_index(end, total_lines).max(start_line);
        let lines = history
            .into_iter()
            .skip(start_line)
            .take(end_line - start_line)
            .collect();
        Self {
            lines,
            start_line,
            end_line,
            total_lines,
        }
    }

    /// Captured lines joined back into one text block.
    #[must_use]
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether nothing (or only blank lines) was captured.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }
}

fn resolve_index(index: i64, total: usize) -> usize {
    let total_i = i64::try_from(total).unwrap_or(i64::MAX);
    let resolved = if index < 0 { total_i + index } else { index };
    usize::try_from(resolved.clamp(0, total_i)).unwrap_or(total)
}

/// Split raw pane output into scrollback lines.
///
/// Trailing whitespace (the blank rows below the cursor) is dropped so that
/// `total_lines` counts only written lines.
#[must_use]
pub fn split_history(raw: &str) -> Vec<String> {
    let trimmed = raw.trim_end();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(str::to_string).collect()
}
