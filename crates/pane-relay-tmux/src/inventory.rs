//! Read-only listing of tmux sessions, windows and panes.

use async_trait::async_trait;
use pane_relay_core::PaneError;
use serde::{Deserialize, Serialize};

use crate::client::TmuxClient;

const SESSION_FORMAT: &str =
    "#{session_id}:#{session_name}:#{?session_attached,1,0}:#{session_windows}";
const WINDOW_FORMAT: &str = "#{window_id}:#{window_name}:#{?window_active,1,0}";
const PANE_FORMAT: &str = "#{pane_id}:#{pane_title}:#{?pane_active,1,0}";

/// A tmux session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmuxSession {
    pub id: String,
    pub name: String,
    pub attached: bool,
    pub windows: u32,
}

/// A window inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmuxWindow {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub session_id: String,
}

/// A pane inside a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmuxPane {
    pub id: String,
    pub window_id: String,
    pub active: bool,
    pub title: String,
}

/// A pane with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneListing {
    #[serde(flatten)]
    pub pane: TmuxPane,
    pub session_id: String,
    pub session_name: String,
}

/// Discovery queries over the multiplexer.
#[async_trait]
pub trait PaneInventory: Send + Sync {
    /// All sessions.
    async fn list_sessions(&self) -> Result<Vec<TmuxSession>, PaneError>;

    /// Windows of `session_id`.
    async fn list_windows(&self, session_id: &str) -> Result<Vec<TmuxWindow>, PaneError>;

    /// Panes of `window_id`.
    async fn list_panes(&self, window_id: &str) -> Result<Vec<TmuxPane>, PaneError>;

    /// Session whose name is exactly `name`.
    async fn find_session_by_name(&self, name: &str) -> Result<Option<TmuxSession>, PaneError> {
        Ok(self
            .list_sessions()
            .await?
            .into_iter()
            .find(|session| session.name == name))
    }

    /// Every pane of every session, in session then window order.
    async fn list_all_panes(&self) -> Result<Vec<PaneListing>, PaneError> {
        let mut listings = Vec::new();
        for session in self.list_sessions().await? {
            for window in self.list_windows(&session.id).await? {
                for pane in self.list_panes(&window.id).await? {
                    listings.push(PaneListing {
                        pane,
                        session_id: session.id.clone(),
                        session_name: session.name.clone(),
                    });
                }
            }
        }
        Ok(listings)
    }

    /// Active pane of the active window of the attached session.
    async fn active_pane(&self) -> Result<Option<TmuxPane>, PaneError> {
        let Some(session) = self
            .list_sessions()
            .await?
            .into_iter()
            .find(|session| session.attached)
        else {
            return Ok(None);
        };
        let Some(window) = self
            .list_windows(&session.id)
            .await?
            .into_iter()
            .find(|window| window.active)
        else {
            return Ok(None);
        };
        Ok(self
            .list_panes(&window.id)
            .await?
            .into_iter()
            .find(|pane| pane.active))
    }
}

#[async_trait]
impl PaneInventory for TmuxClient {
    async fn list_sessions(&self) -> Result<Vec<TmuxSession>, PaneError> {
        let output = self.run(&["list-sessions", "-F", SESSION_FORMAT]).await?;
        parse_sessions(&output)
    }

    async fn list_windows(&self, session_id: &str) -> Result<Vec<TmuxWindow>, PaneError> {
        let output = self
            .run(&["list-windows", "-t", session_id, "-F", WINDOW_FORMAT])
            .await?;
        parse_windows(&output, session_id)
    }

    async fn list_panes(&self, window_id: &str) -> Result<Vec<TmuxPane>, PaneError> {
        let output = self
            .run(&["list-panes", "-t", window_id, "-F", PANE_FORMAT])
            .await?;
        parse_panes(&output, window_id)
    }
}

/// Parse `list-sessions` output in [`SESSION_FORMAT`].
///
/// Session names may contain `:`, so the id is split from the front and the
/// flag and window count from the back.
///
/// # Errors
/// Returns `InvalidOutput` for lines that do not match the format.
pub fn parse_sessions(output: &str) -> Result<Vec<TmuxSession>, PaneError> {
    records(output)
        .map(|line| -> Result<TmuxSession, PaneError> {
            let (id, rest) = split_front(line)?;
            let (rest, windows) = split_back(rest, line)?;
            let (name, attached) = split_back(rest, line)?;
            Ok(TmuxSession {
                id: id.to_string(),
                name: name.to_string(),
                attached: attached == "1",
                windows: windows.parse().map_err(|_| invalid(line))?,
            })
        })
        .collect()
}

/// Parse `list-windows` output in [`WINDOW_FORMAT`].
///
/// # Errors
/// Returns `InvalidOutput` for lines that do not match the format.
pub fn parse_windows(output: &str, session_id: &str) -> Result<Vec<TmuxWindow>, PaneError> {
    records(output)
        .map(|line| -> Result<TmuxWindow, PaneError> {
            let (id, rest) = split_front(line)?;
            let (name, active) = split_back(rest, line)?;
            Ok(TmuxWindow {
                id: id.to_string(),
                name: name.to_string(),
                active: active == "1",
                session_id: session_id.to_string(),
            })
        })
        .collect()
}

/// Parse `list-panes` output in [`PANE_FORMAT`].
///
/// # Errors
/// Returns `InvalidOutput` for lines that do not match the format.
pub fn parse_panes(output: &str, window_id: &str) -> Result<Vec<TmuxPane>, PaneError> {
    records(output)
        .map(|line| -> Result<TmuxPane, PaneError> {
            let (id, rest) = split_front(line)?;
            let (title, active) = split_back(rest, line)?;
            Ok(TmuxPane {
                id: id.to_string(),
                window_id: window_id.to_string(),
                active: active == "1",
                title: title.to_string(),
            })
        })
        .collect()
}

fn records(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|line| !line.trim().is_empty())
}

fn split_front(line: &str) -> Result<(&str, &str), PaneError> {
    line.split_once(':').ok_or_else(|| invalid(line))
}

fn split_back<'a>(rest: &'a str, line: &str) -> Result<(&'a str, &'a str), PaneError> {
    rest.rsplit_once(':').ok_or_else(|| invalid(line))
}

fn invalid(line: &str) -> PaneError {
    PaneError::InvalidOutput(line.to_string())
}
