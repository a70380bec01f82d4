//! In-memory pane that behaves like an interactive shell.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use pane_relay_core::{
    Keystroke, PaneError, PaneReader, PaneTarget, PaneWriter,
    marker::{END_TAG, START_TAG},
};

/// Echoes typed lines into its scrollback and, for wrapped commands, prints
/// the markers and canned output once enough reads have happened.
pub struct FakeShell {
    history: Mutex<Vec<String>>,
    scheduled: Mutex<Vec<(usize, Vec<String>)>>,
    outputs: HashMap<String, (String, i32)>,
    reads: AtomicUsize,
    keys: AtomicUsize,
    finish_after: Option<usize>,
}

impl FakeShell {
    /// Wrapped commands finish on the `reads`-th read after being sent.
    pub fn finishing_after(reads: usize) -> Self {
        Self::build(Some(reads))
    }

    /// Wrapped commands never print their markers until [`Self::finish_now`].
    pub fn never_finishing() -> Self {
        Self::build(None)
    }

    fn build(finish_after: Option<usize>) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            scheduled: Mutex::new(Vec::new()),
            outputs: HashMap::new(),
            reads: AtomicUsize::new(0),
            keys: AtomicUsize::new(0),
            finish_after,
        }
    }

    pub fn with_output(mut self, command: &str, output: &str, exit_code: i32) -> Self {
        self.outputs
            .insert(command.to_string(), (output.to_string(), exit_code));
        self
    }

    pub fn push_lines(&self, lines: impl IntoIterator<Item = String>) {
        self.history.lock().unwrap().extend(lines);
    }

    /// Print everything still scheduled.
    pub fn finish_now(&self) {
        let scheduled = std::mem::take(&mut *self.scheduled.lock().unwrap());
        for (_, lines) in scheduled {
            self.push_lines(lines);
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> usize {
        self.keys.load(Ordering::SeqCst)
    }

    pub fn lines(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }

    /// Lines a shell prints for `echo "<start>"; cmd; echo "<end>$?"`.
    fn run_wrapped(&self, line: &str) -> Option<Vec<String>> {
        let rest = line.strip_prefix("echo \"")?;
        let (start, rest) = rest.split_once("\"; ")?;
        let (command, end) = rest.rsplit_once("; echo \"")?;
        if !start.starts_with(START_TAG) || !end.starts_with(END_TAG) {
            return None;
        }
        let (output, exit_code) = self
            .outputs
            .get(command)
            .cloned()
            .unwrap_or_default();
        let end_prefix = end.strip_suffix("$?\"")?;

        let mut printed = vec![start.to_string()];
        if !output.is_empty() {
            printed.extend(output.lines().map(str::to_string));
        }
        printed.push(format!("{end_prefix}{exit_code}"));
        Some(printed)
    }
}

#[async_trait]
impl PaneReader for FakeShell {
    async fn capture_history(
        &self,
        _target: &PaneTarget,
        _include_color: bool,
    ) -> Result<Vec<String>, PaneError> {
        let reads = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        let due: Vec<Vec<String>> = {
            let mut scheduled = self.scheduled.lock().unwrap();
            let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut *scheduled)
                .into_iter()
                .partition(|(at, _)| *at <= reads);
            *scheduled = later;
            due.into_iter().map(|(_, lines)| lines).collect()
        };
        for lines in due {
            self.push_lines(lines);
        }
        Ok(self.lines())
    }
}

#[async_trait]
impl PaneWriter for FakeShell {
    async fn send_line(&self, _target: &PaneTarget, text: &str) -> Result<(), PaneError> {
        self.history.lock().unwrap().push(format!("$ {text}"));
        if let Some(printed) = self.run_wrapped(text) {
            let at = self
                .finish_after
                .map_or(usize::MAX, |after| self.reads() + after);
            self.scheduled.lock().unwrap().push((at, printed));
        }
        Ok(())
    }

    async fn send_key(&self, _target: &PaneTarget, _key: &Keystroke) -> Result<(), PaneError> {
        self.keys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
