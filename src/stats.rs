use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::dispatch::ChatDispatcher;
use crate::surface::Surface;

/// Background usage-stats refresh on a fixed interval. Failures are
/// dropped without retry; the loop just waits for the next tick.
pub fn spawn_refresh(
    dispatcher: Arc<dyn ChatDispatcher>,
    surface: Arc<dyn Surface>,
    every: Duration
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately; skip it so refreshes start one
        // full interval in.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match dispatcher.fetch_stats().await {
                Ok(Some(stats)) => surface.show_stats(&stats),
                Ok(None) => {}
                Err(e) => debug!("stats refresh failed: {}", e),
            }
        }
    })
}
