//! Server state

use std::sync::Arc;

use crate::tracker::Tracker;

/// Server state shared across handlers
pub struct ServerState {
    pub tracker: Arc<Tracker>,
}

impl ServerState {
    pub fn new(tracker: Arc<Tracker>) -> Self {
        Self { tracker }
    }
}
