//! Server configuration: TOML file plus CLI overrides.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use pane_relay_core::ShellDialect;
use pane_relay_session::ManagerSettings;
use pane_relay_tmux::detect_shell_dialect;
use serde::Deserialize;

use crate::cli::Args;

/// Dialect name that defers to `$SHELL`.
const AUTO_DIALECT: &str = "auto";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub shell: ShellSection,
    pub tmux: TmuxSection,
    pub tracker: TrackerSection,
    pub janitor: JanitorSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// `bash`, `zsh`, `fish` or `auto`.
    pub dialect: String,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            dialect: ShellDialect::Bash.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TmuxSection {
    pub program: String,
    pub command_timeout_secs: u64,
}

impl Default for TmuxSection {
    fn default() -> Self {
        Self {
            program: "tmux".to_string(),
            command_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    /// Lines read from the end of a pane when looking for markers.
    pub tail_lines: usize,
    pub poll_interval_ms: u64,
    pub default_timeout_secs: u64,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            tail_lines: pane_relay_core::tracker::DEFAULT_TAIL_LINES,
            poll_interval_ms: 1000,
            default_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JanitorSection {
    pub interval_secs: u64,
    pub max_age_minutes: u64,
    /// Age applied before listing commands.
    pub listing_max_age_minutes: u64,
}

impl Default for JanitorSection {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_age_minutes: 60,
            listing_max_age_minutes: 10,
        }
    }
}

impl ServerConfig {
    /// Apply CLI flags on top of file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(shell) = &args.shell_type {
            self.shell.dialect.clone_from(shell);
        }
        if let Some(bind) = args.bind {
            self.server.bind = bind;
        }
        if let Some(port) = args.port {
            self.server.bind.set_port(port);
        }
    }

    /// Dialect used for every injected command.
    #[must_use]
    pub fn shell_dialect(&self) -> ShellDialect {
        if self.shell.dialect.eq_ignore_ascii_case(AUTO_DIALECT) {
            detect_shell_dialect()
        } else {
            ShellDialect::from_name_lossy(&self.shell.dialect)
        }
    }

    #[must_use]
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            poll_interval: Duration::from_millis(self.tracker.poll_interval_ms.max(1)),
            default_timeout: Duration::from_secs(self.tracker.default_timeout_secs),
            listing_max_age_minutes: self.janitor.listing_max_age_minutes,
        }
    }

    #[must_use]
    pub const fn tmux_timeout(&self) -> Duration {
        Duration::from_secs(self.tmux.command_timeout_secs)
    }

    #[must_use]
    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor.interval_secs.max(1))
    }
}

/// `<config dir>/pane-relay/config.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pane-relay").join("config.toml"))
}

/// Load configuration.
///
/// An explicit path must exist. Without one the default path is used if
/// present, otherwise built-in defaults.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path_override: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let path = match path_override {
        Some(path) => path.to_path_buf(),
        None => match default_config_path().filter(|path| path.is_file()) {
            Some(path) => path,
            None => {
                tracing::debug!("No config file, using defaults");
                return Ok(ServerConfig::default());
            }
        },
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = parse_config(&text)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse TOML config text; missing keys take defaults.
///
/// # Errors
/// Returns the TOML error for malformed input or wrong value types.
pub fn parse_config(text: &str) -> Result<ServerConfig, toml::de::Error> {
    toml::from_str(text)
}
