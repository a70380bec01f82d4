//! pane-relay: run shell commands in tmux panes and track their completion.
//!
//! Run with: cargo run -p pane-relay-server -- --shell-type auto

mod cli;
mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pane_relay_core::CommandTracker;
use pane_relay_executor::CommandInjector;
use pane_relay_session::{CommandManager, spawn_janitor};
use pane_relay_tmux::TmuxClient;
use pane_relay_transport::{ApiState, create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = config::load_config(args.config.as_deref())?;
    config.apply_args(&args);

    let dialect = config.shell_dialect();
    tracing::info!(%dialect, "Using shell dialect");

    let tmux = Arc::new(
        TmuxClient::locate(&config.tmux.program, config.tmux_timeout())
            .await
            .with_context(|| format!("cannot find `{}`", config.tmux.program))?,
    );
    if !tmux.is_running().await {
        tracing::warn!("No tmux server is running; commands will fail until one is started");
    }

    let tracker = Arc::new(CommandTracker::with_tail_lines(
        tmux.clone(),
        config.tracker.tail_lines,
    ));
    let injector = CommandInjector::new(Arc::clone(&tracker), tmux.clone(), dialect);
    let manager = Arc::new(CommandManager::new(
        injector,
        tmux.clone(),
        config.manager_settings(),
    ));
    let janitor = spawn_janitor(
        tracker,
        config.janitor_interval(),
        config.janitor.max_age_minutes,
    );

    let app = create_router(ApiState {
        manager,
        inventory: tmux,
        sweep_max_age_minutes: config.janitor.max_age_minutes,
    });

    let addr = config.server.bind;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    janitor.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
