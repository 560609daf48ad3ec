//! Log view with optional auto-refresh timer

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::ResourceClient;
use crate::dispatch::{Dispatcher, TrackerEvent};
use crate::models::LogTarget;

/// Log poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Refresh interval while auto-refresh is on
    pub interval: Duration,

    /// Most recent lines fetched per refresh
    pub line_limit: usize,

    /// Whether newly opened views refresh automatically
    pub auto_refresh: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            line_limit: 500,
            auto_refresh: true,
        }
    }
}

struct Timer {
    id: Uuid,
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

struct ActiveView {
    id: Uuid,
    target: LogTarget,
    timer: Option<Timer>,
}

impl ActiveView {
    fn stop_timer(&mut self) -> Option<JoinHandle<()>> {
        let timer = self.timer.take()?;
        debug!("Stopping log timer {} for view {}", timer.id, self.id);
        // The receiver may already be gone if the task exited
        let _ = timer.stop_tx.send(());
        Some(timer.handle)
    }
}

struct SlotInner {
    options: Options,
    client: Arc<ResourceClient>,
    dispatcher: Arc<dyn Dispatcher>,
    auto_refresh: AtomicBool,
    active: Mutex<Option<ActiveView>>,
    running_timers: AtomicUsize,
}

impl SlotInner {
    fn is_current_view(&self, view_id: Uuid) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.as_ref().is_some_and(|view| view.id == view_id)
    }

    fn is_current_timer(&self, timer_id: Uuid) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active
            .as_ref()
            .and_then(|view| view.timer.as_ref())
            .is_some_and(|timer| timer.id == timer_id)
    }
}

/// The single log view slot.
///
/// At most one view is open and at most one refresh timer runs. Opening a new
/// view, closing the view or turning auto-refresh off stops the running timer
/// before anything else claims the slot.
pub struct LogViewSlot {
    inner: Arc<SlotInner>,
}

impl LogViewSlot {
    pub fn new(options: Options, client: Arc<ResourceClient>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let auto_refresh = AtomicBool::new(options.auto_refresh);
        Self {
            inner: Arc::new(SlotInner {
                options,
                client,
                dispatcher,
                auto_refresh,
                active: Mutex::new(None),
                running_timers: AtomicUsize::new(0),
            }),
        }
    }

    /// Open a view on `target`, replacing any open view, and load its logs once.
    /// Returns the id of the new view.
    pub async fn open(&self, target: LogTarget) -> Uuid {
        let view_id = Uuid::new_v4();
        {
            let mut active = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(mut previous) = active.take() {
                previous.stop_timer();
            }
            *active = Some(ActiveView {
                id: view_id,
                target: target.clone(),
                timer: None,
            });
        }
        info!("Opened log view {} on {:?}", view_id, target);

        let lines = self
            .inner
            .client
            .fetch_logs(&target, self.inner.options.line_limit)
            .await;

        if !self.inner.is_current_view(view_id) {
            debug!("Log view {} replaced while loading, discarding lines", view_id);
            return view_id;
        }
        self.inner.dispatcher.dispatch(TrackerEvent::LogsUpdated {
            target,
            lines,
        });

        if self.auto_refresh() {
            self.start_timer(view_id);
        }
        view_id
    }

    /// Flip auto-refresh, starting or stopping the timer of the open view.
    /// Returns the new setting.
    pub fn toggle_auto_refresh(&self) -> bool {
        let enabled = !self.inner.auto_refresh.fetch_xor(true, Ordering::SeqCst);
        info!("Log auto-refresh {}", if enabled { "enabled" } else { "disabled" });

        let view_id = {
            let mut active = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
            match active.as_mut() {
                Some(view) => {
                    view.stop_timer();
                    Some(view.id)
                }
                None => None,
            }
        };

        if let (true, Some(view_id)) = (enabled, view_id) {
            self.start_timer(view_id);
        }
        enabled
    }

    pub fn auto_refresh(&self) -> bool {
        self.inner.auto_refresh.load(Ordering::SeqCst)
    }

    /// Target of the open view, if any
    pub fn current(&self) -> Option<LogTarget> {
        let active = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
        active.as_ref().map(|view| view.target.clone())
    }

    /// Close the open view and stop its timer
    pub fn close(&self) {
        let mut active = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut view) = active.take() {
            view.stop_timer();
            info!("Closed log view {}", view.id);
        }
    }

    /// Number of refresh timer tasks still alive
    pub fn running_timers(&self) -> usize {
        self.inner.running_timers.load(Ordering::SeqCst)
    }

    /// Close the view and wait for its timer task to finish
    pub async fn shutdown(&self) {
        let handle = {
            let mut active = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
            active.take().and_then(|mut view| view.stop_timer())
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn start_timer(&self, view_id: Uuid) {
        let mut active = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
        let Some(view) = active.as_mut().filter(|view| view.id == view_id) else {
            return;
        };
        view.stop_timer();

        let timer_id = Uuid::new_v4();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let inner = self.inner.clone();
        let target = view.target.clone();

        let handle = tokio::spawn(async move {
            inner.running_timers.fetch_add(1, Ordering::SeqCst);
            run(
                &inner.options,
                inner.as_ref(),
                timer_id,
                target,
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = stop_rx.await;
                }),
            )
            .await;
            inner.running_timers.fetch_sub(1, Ordering::SeqCst);
        });

        debug!("Started log timer {} for view {}", timer_id, view_id);
        view.timer = Some(Timer {
            id: timer_id,
            stop_tx,
            handle,
        });
    }
}

/// Run the log refresh loop for one view.
///
/// Stops between ticks once `shutdown_signal` resolves. A fetch already in
/// flight runs to completion; its lines are dropped if the timer was
/// replaced in the meantime.
async fn run<S, F>(
    options: &Options,
    slot: &SlotInner,
    timer_id: Uuid,
    target: LogTarget,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    debug!("Log poller {} starting...", timer_id);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_signal => {
                debug!("Log poller {} shutting down...", timer_id);
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }

        let lines = slot.client.fetch_logs(&target, options.line_limit).await;

        if !slot.is_current_timer(timer_id) {
            debug!("Log poller {} superseded, discarding {} lines", timer_id, lines.len());
            continue;
        }
        slot.dispatcher.dispatch(TrackerEvent::LogsUpdated {
            target: target.clone(),
            lines,
        });
    }
}
