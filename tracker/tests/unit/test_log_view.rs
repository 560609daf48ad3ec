//! Log view slot tests, driven with paused time

use std::sync::Arc;
use std::time::Duration;

use railtrack::dispatch::TrackerEvent;
use railtrack::errors::ApiError;
use railtrack::models::LogTarget;
use railtrack::tracker::{Tracker, TrackerOptions};
use railtrack::workers::log_poller;

use crate::support::{log_line, Calls, FakeApi, RecordingDispatcher};

fn tracker(api: &Arc<FakeApi>, dispatcher: &Arc<RecordingDispatcher>, auto_refresh: bool) -> Tracker {
    let options = TrackerOptions {
        log_view: log_poller::Options {
            interval: Duration::from_secs(5),
            line_limit: 500,
            auto_refresh,
        },
        ..Default::default()
    };
    Tracker::new(api.clone(), dispatcher.clone(), options)
}

fn deployment_target(id: &str) -> LogTarget {
    LogTarget::Deployment {
        deployment_id: id.to_string(),
    }
}

/// Let spawned timer tasks run up to their next sleep
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_loads_once_without_auto_refresh() {
    let api = Arc::new(FakeApi::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    api.set_logs(Ok(vec![log_line("starting"), log_line("listening")]));
    let tracker = tracker(&api, &dispatcher, false);

    tracker.open_log_view(deployment_target("d1")).await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(Calls::get(&api.calls.logs), 1);
    assert_eq!(tracker.log_view().running_timers(), 0);
    match &dispatcher.events()[..] {
        [TrackerEvent::LogsUpdated { target, lines }] => {
            assert_eq!(target, &deployment_target("d1"));
            assert_eq!(lines.len(), 2);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_toggling_never_leaves_two_timers() {
    let api = Arc::new(FakeApi::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let tracker = tracker(&api, &dispatcher, false);

    tracker.open_log_view(deployment_target("d1")).await;
    assert!(tracker.toggle_auto_refresh());
    assert!(!tracker.toggle_auto_refresh());
    assert!(tracker.toggle_auto_refresh());
    settle().await;
    assert_eq!(tracker.log_view().running_timers(), 1);

    tokio::time::sleep(Duration::from_millis(20_500)).await;

    // One load on open, then one refresh per 5 s from a single timer
    assert_eq!(Calls::get(&api.calls.logs), 5);
    assert_eq!(dispatcher.log_updates(), 5);
    assert_eq!(tracker.log_view().running_timers(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_opening_another_view_replaces_the_timer() {
    let api = Arc::new(FakeApi::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let tracker = tracker(&api, &dispatcher, true);

    tracker.open_log_view(deployment_target("d1")).await;
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    tracker.open_log_view(deployment_target("d2")).await;
    settle().await;

    assert_eq!(tracker.log_view().running_timers(), 1);
    assert_eq!(tracker.log_view().current(), Some(deployment_target("d2")));

    dispatcher.clear();
    tokio::time::sleep(Duration::from_millis(10_500)).await;

    let events = dispatcher.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|event| matches!(
        event,
        TrackerEvent::LogsUpdated { target, .. } if *target == deployment_target("d2")
    )));
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_refreshing() {
    let api = Arc::new(FakeApi::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let tracker = tracker(&api, &dispatcher, true);

    tracker.open_log_view(deployment_target("d1")).await;
    settle().await;
    assert_eq!(tracker.log_view().running_timers(), 1);

    tracker.close_log_view();
    settle().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(Calls::get(&api.calls.logs), 1);
    assert_eq!(tracker.log_view().running_timers(), 0);
    assert!(tracker.log_view().current().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_log_failure_is_a_warning() {
    let api = Arc::new(FakeApi::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    api.set_logs(Err(ApiError::Unreachable("connection reset".to_string())));
    let tracker = tracker(&api, &dispatcher, false);

    tracker.open_log_view(deployment_target("d1")).await;

    assert_eq!(dispatcher.warnings(), 1);
    assert_eq!(dispatcher.errors(), 0);
    assert!(dispatcher.events().iter().any(|event| matches!(
        event,
        TrackerEvent::LogsUpdated { lines, .. } if lines.is_empty()
    )));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_timer() {
    let api = Arc::new(FakeApi::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let tracker = tracker(&api, &dispatcher, true);

    tracker.open_log_view(deployment_target("d1")).await;
    settle().await;
    tracker.shutdown().await;

    assert_eq!(tracker.log_view().running_timers(), 0);
}
