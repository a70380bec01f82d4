//! CLI argument parsing via clap.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Run shell commands in tmux panes and track their completion over HTTP.
#[derive(Debug, Parser)]
#[command(name = "pane-relay", version)]
pub struct Args {
    /// Path to config file (default: <config dir>/pane-relay/config.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Shell dialect of the panes: bash, zsh, fish or auto.
    #[arg(short = 's', long = "shell-type")]
    pub shell_type: Option<String>,

    /// Override the listening port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Override the listening address.
    #[arg(long = "bind")]
    pub bind: Option<SocketAddr>,
}
