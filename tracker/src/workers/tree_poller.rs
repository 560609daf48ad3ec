//! Tree polling worker

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::tracker::{TickOutcome, Tracker};

/// Tree poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval; also the retry interval after a failed fetch
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Run the tree poller worker.
///
/// Every interval starts a tick without waiting for the previous one. A tick
/// that outlives its interval makes the next one skip, since the tracker lets
/// only one tick run at a time. In-flight ticks are awaited on shutdown.
pub async fn run(
    options: &Options,
    tracker: Arc<Tracker>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Tree poller starting (every {:?})...", options.interval);

    let mut ticker = interval_at(Instant::now() + options.interval, options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = JoinSet::new();

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Tree poller shutting down...");
                break;
            }
            _ = ticker.tick() => {}
        }

        // Reap finished ticks
        while ticks.try_join_next().is_some() {}

        let tracker = tracker.clone();
        ticks.spawn(async move {
            match tracker.poll_tick().await {
                TickOutcome::Skipped => debug!("Poll tick skipped, previous tick still running"),
                TickOutcome::Completed(summary) => debug!(
                    "Poll tick completed: {} buckets, {} transitions, {} failed",
                    summary.buckets, summary.transitions, summary.failed
                ),
            }
        });
    }

    while ticks.join_next().await.is_some() {}
}
