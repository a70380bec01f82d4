//! tmux CLI client implementing the pane collaborator traits.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use pane_relay_core::{
    Keystroke, PaneError, PaneReader, PaneTarget, PaneWriter, pane::split_history,
};
use tokio::process::Command;

use crate::shell::resolve_executable_path;

/// Default limit for a single tmux invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `tmux` subcommands as short-lived child processes.
#[derive(Debug, Clone)]
pub struct TmuxClient {
    program: PathBuf,
    command_timeout: Duration,
}

impl TmuxClient {
    /// Locate `program` (usually `"tmux"`) on PATH.
    ///
    /// # Errors
    /// Returns `ExecutableNotFound` if it cannot be resolved.
    pub async fn locate(program: &str, command_timeout: Duration) -> Result<Self, PaneError> {
        let program = resolve_executable_path(program)
            .await
            .ok_or_else(|| PaneError::ExecutableNotFound(program.to_string()))?;
        tracing::debug!(program = %program.display(), "Resolved tmux executable");
        Ok(Self::with_program(program, command_timeout))
    }

    /// Use an explicit executable path without resolving it.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>, command_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            command_timeout,
        }
    }

    /// Path of the tmux executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run a tmux subcommand and return its stdout.
    ///
    /// # Errors
    /// Returns `Io` if the process cannot be spawned, `Timeout` if it does not
    /// exit in time and `CommandFailed` on a non-zero exit status.
    pub async fn run(&self, args: &[&str]) -> Result<String, PaneError> {
        let rendered = render_invocation(args);
        tracing::debug!(command = %rendered, "Running tmux");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.command_timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(command = %rendered, "tmux command timed out");
                return Err(PaneError::Timeout {
                    command: rendered,
                    secs: self.command_timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(command = %rendered, %stderr, "tmux command failed");
            return Err(PaneError::CommandFailed {
                command: rendered,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Whether a tmux server is reachable.
    pub async fn is_running(&self) -> bool {
        self.run(&["list-sessions", "-F", "#{session_name}"])
            .await
            .is_ok()
    }
}

#[async_trait]
impl PaneReader for TmuxClient {
    async fn capture_history(
        &self,
        target: &PaneTarget,
        include_color: bool,
    ) -> Result<Vec<String>, PaneError> {
        let output = self
            .run(&capture_args(target.as_str(), include_color))
            .await?;
        Ok(split_history(&output))
    }
}

#[async_trait]
impl PaneWriter for TmuxClient {
    async fn send_line(&self, target: &PaneTarget, text: &str) -> Result<(), PaneError> {
        self.run(&literal_args(target.as_str(), text)).await?;
        self.run(&["send-keys", "-t", target.as_str(), "Enter"])
            .await?;
        Ok(())
    }

    async fn send_key(&self, target: &PaneTarget, key: &Keystroke) -> Result<(), PaneError> {
        match key {
            Keystroke::Named(named) => {
                let name = named.name();
                self.run(&["send-keys", "-t", target.as_str(), name.as_str()])
                    .await?;
            }
            Keystroke::Char(c) => {
                let mut buf = [0; 4];
                let text = c.encode_utf8(&mut buf);
                self.run(&literal_args(target.as_str(), text)).await?;
            }
        }
        Ok(())
    }
}

/// `capture-pane` over the whole history (`-S -`), optionally with escapes.
fn capture_args(target: &str, include_color: bool) -> Vec<&str> {
    let mut args = vec!["capture-pane", "-p"];
    if include_color {
        args.push("-e");
    }
    args.extend(["-t", target, "-S", "-"]);
    args
}

/// `send-keys -l` so the text is typed verbatim rather than parsed as key names.
fn literal_args<'a>(target: &'a str, text: &'a str) -> [&'a str; 6] {
    ["send-keys", "-t", target, "-l", "--", text]
}

fn render_invocation(args: &[&str]) -> String {
    let joined = shlex::try_join(args.iter().copied()).unwrap_or_else(|_| args.join(" "));
    format!("tmux {joined}")
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_err;

    use super::*;

    #[test]
    fn capture_reads_full_history() {
        assert_eq!(
            capture_args("%3", false),
            vec!["capture-pane", "-p", "-t", "%3", "-S", "-"]
        );
        assert_eq!(
            capture_args("%3", true),
            vec!["capture-pane", "-p", "-e", "-t", "%3", "-S", "-"]
        );
    }

    #[test]
    fn literal_text_is_one_argument() {
        let text = "echo 'it''s' \"quoted\"; ls";
        let args = literal_args("%0", text);
        assert_eq!(args[5], text);
        assert_eq!(&args[..5], &["send-keys", "-t", "%0", "-l", "--"]);
    }

    #[test]
    fn renders_invocation_for_logs() {
        let args = ["send-keys", "-t", "%0", "-l", "--", "echo 'hi' there"];
        let rendered = render_invocation(&args);
        let words = shlex::split(rendered.strip_prefix("tmux ").unwrap()).unwrap();
        assert_eq!(words, args);
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let client = TmuxClient::with_program("/definitely/not/here/tmux", DEFAULT_COMMAND_TIMEOUT);
        let err = assert_err!(client.run(&["-V"]).await);
        assert!(matches!(err, PaneError::Io(_)));
        assert!(!client.is_running().await);
    }

    #[tokio::test]
    async fn locate_reports_unknown_program() {
        let err = assert_err!(
            TmuxClient::locate("pane-relay-no-such-tmux", DEFAULT_COMMAND_TIMEOUT).await
        );
        assert!(matches!(
            err,
            PaneError::ExecutableNotFound(name) if name == "pane-relay-no-such-tmux"
        ));
    }
}
