//! Tree poller worker tests, driven with paused time

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use railtrack::models::{DeploymentKey, DeploymentStatus, ResourceRef};
use railtrack::tracker::{TickStats, Tracker, TrackerOptions};
use railtrack::workers::tree_poller;

use crate::support::{deployment, FakeApi, RecordingDispatcher};

#[tokio::test(start_paused = true)]
async fn test_slow_tick_makes_the_next_one_skip() {
    let api = Arc::new(FakeApi::new().with_delay(Duration::from_secs(45)));
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let key = DeploymentKey::new("s1", "e1");
    api.push_deployments(
        &key,
        Ok(vec![deployment("d1", DeploymentStatus::Building, &key)]),
    );
    let tracker = Arc::new(Tracker::new(
        api.clone(),
        dispatcher.clone(),
        TrackerOptions::default(),
    ));
    tracker
        .select_resource(&ResourceRef::Service {
            service_id: "s1".to_string(),
            environment_id: "e1".to_string(),
        })
        .await;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let worker_tracker = tracker.clone();
    let worker = tokio::spawn(async move {
        tree_poller::run(
            &tree_poller::Options {
                interval: Duration::from_secs(30),
            },
            worker_tracker,
            Box::pin(async move {
                let _ = stop_rx.await;
            }),
        )
        .await;
    });

    // Ticks at 30 s (runs until 75 s), 60 s (overlaps, skipped), 90 s (running)
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(
        tracker.tick_stats(),
        TickStats {
            started: 2,
            completed: 1,
            skipped: 1,
        }
    );

    // Shutdown waits for the tick still in flight
    let _ = stop_tx.send(());
    worker.await.unwrap();
    assert_eq!(tracker.tick_stats().completed, 2);
}
