//! Per-deployment status tracking across polling cycles

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Deployment, DeploymentStatus, TransitionEvent};

/// Remembers the last observed status of every deployment and reports
/// each status change exactly once.
///
/// Entries are never evicted: the map lives as long as the session and
/// grows with the number of distinct deployments seen.
#[derive(Debug, Default)]
pub struct TransitionDetector {
    last_known: HashMap<String, DeploymentStatus>,
}

impl TransitionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the deployment's current status, returning the transition if
    /// it differs from the previous observation.
    ///
    /// The first observation of an id only sets the baseline.
    pub fn observe(&mut self, deployment: &Deployment) -> Option<TransitionEvent> {
        let current = deployment.status;
        match self.last_known.insert(deployment.id.clone(), current) {
            None => {
                debug!("Tracking deployment {} ({})", deployment.id, current);
                None
            }
            Some(previous) if previous == current => None,
            Some(previous) => Some(TransitionEvent {
                deployment_id: deployment.id.clone(),
                from: previous,
                to: current,
            }),
        }
    }

    /// Observe a batch, in order
    pub fn observe_all(&mut self, deployments: &[Deployment]) -> Vec<TransitionEvent> {
        deployments.iter().filter_map(|d| self.observe(d)).collect()
    }

    pub fn last_status(&self, deployment_id: &str) -> Option<DeploymentStatus> {
        self.last_known.get(deployment_id).copied()
    }

    pub fn len(&self) -> usize {
        self.last_known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_known.is_empty()
    }
}
