//! Outbound events towards the host UI

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::detect::Notification;
use crate::errors::ApiErrorKind;
use crate::models::{LogLine, LogTarget};

/// Everything the tracker tells its host
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// The tree must re-render
    HierarchyChanged,

    /// Replace the log view contents with `lines`
    LogsUpdated {
        target: LogTarget,
        lines: Vec<LogLine>,
    },

    /// A build-completion transition
    Transition(Notification),

    /// Non-fatal issue, shown without blocking
    Warning { message: String },

    /// Persistent failure of the platform API, such as a rejected credential
    Error { kind: ApiErrorKind, message: String },
}

/// Receiver of tracker events; implemented by the host integration
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, event: TrackerEvent);
}

/// Fans events out to any number of subscribers
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: broadcast::Sender<TrackerEvent>,
}

impl ChannelDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, event: TrackerEvent) {
        // No subscriber is not an error: the host may not be listening yet
        if self.sender.send(event).is_err() {
            trace!("No subscriber for tracker event");
        }
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

impl Dispatcher for NoopDispatcher {
    fn dispatch(&self, _event: TrackerEvent) {}
}
