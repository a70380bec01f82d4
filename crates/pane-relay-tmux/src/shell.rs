//! Executable lookup and login shell detection.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use pane_relay_core::ShellDialect;

/// Resolve an executable by name.
///
/// The search order is:
/// 1. Explicit paths (absolute or containing a separator).
/// 2. The current process PATH via `which`.
pub async fn resolve_executable_path(executable: &str) -> Option<PathBuf> {
    if executable.trim().is_empty() {
        return None;
    }

    let path = Path::new(executable);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }

    which_async(executable).await
}

async fn which_async(executable: &str) -> Option<PathBuf> {
    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || which::which(executable))
        .await
        .ok()
        .and_then(Result::ok)
}

/// Dialect of the user's login shell, from `$SHELL`.
///
/// Anything that is not zsh or fish is treated as bash.
#[must_use]
pub fn detect_shell_dialect() -> ShellDialect {
    std::env::var_os("SHELL").map_or(ShellDialect::Bash, |shell| {
        let dialect = dialect_for_path(Path::new(&shell));
        tracing::debug!(shell = ?shell, %dialect, "Detected shell dialect");
        dialect
    })
}

/// Dialect implied by a shell's file name.
#[must_use]
pub fn dialect_for_path(path: &Path) -> ShellDialect {
    match path.file_name().and_then(OsStr::to_str) {
        Some("zsh") => ShellDialect::Zsh,
        Some("fish") => ShellDialect::Fish,
        _ => ShellDialect::Bash,
    }
}
