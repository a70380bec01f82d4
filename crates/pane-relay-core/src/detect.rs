//! Completion detection over raw pane text.

use crate::{
    marker::{end_marker_prefix, start_marker},
    record::CommandId,
};

/// What the pane text says about a wrapped command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Markers missing, out of order, or the exit code is not readable yet.
    Pending,
    /// Finished with exit code zero.
    Completed { exit_code: i32, output: String },
    /// Finished with a non-zero exit code.
    Error { exit_code: i32, output: String },
}

/// Scan `buffer` for the markers of command `id`.
///
/// The last occurrence of each marker wins: the shell echoes the typed input
/// line (which contains both markers) before the command's real output.
/// An end marker whose exit code is missing or cut off by a line wrap is
/// indistinguishable from an unfinished command and reads as pending.
#[must_use]
pub fn detect_completion(buffer: &str, id: CommandId) -> Completion {
    let start = start_marker(id);
    let end_prefix = end_marker_prefix(id);

    let start_idx = buffer.rfind(&start);
    let end_idx = buffer.rfind(&end_prefix);
    let (Some(start_idx), Some(end_idx)) = (start_idx, end_idx) else {
        return Completion::Pending;
    };
    if end_idx <= start_idx {
        return Completion::Pending;
    }

    let Some(exit_code) = parse_exit_code(&buffer[end_idx + end_prefix.len()..]) else {
        return Completion::Pending;
    };

    let output = buffer[start_idx + start.len()..end_idx].trim().to_string();
    if exit_code == 0 {
        Completion::Completed { exit_code, output }
    } else {
        Completion::Error { exit_code, output }
    }
}

/// Read the digits directly after the end prefix, on the same line.
fn parse_exit_code(after_prefix: &str) -> Option<i32> {
    let line = after_prefix.lines().next()?;
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    line[..digits_end].parse().ok()
}
