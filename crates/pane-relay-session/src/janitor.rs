//! Background eviction of finished commands.

use std::{sync::Arc, time::Duration};

use pane_relay_core::CommandTracker;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Shortest accepted sweep period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Evict finished commands older than `max_age_minutes` every `every`.
///
/// The first sweep runs immediately. Abort the returned handle to stop it.
/// Periods below one millisecond are raised to one millisecond.
pub fn spawn_janitor(
    tracker: Arc<CommandTracker>,
    every: Duration,
    max_age_minutes: u64,
) -> JoinHandle<()> {
    let every = every.max(MIN_INTERVAL);
    tracing::info!(
        interval_ms = every.as_millis(),
        max_age_minutes,
        "Starting command janitor"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match tracker.evict(max_age_minutes) {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Janitor sweep"),
                Err(e) => tracing::warn!(error = %e, "Janitor sweep failed"),
            }
        }
    })
}
