//! Which transitions are worth telling the user about

use serde::Serialize;

use crate::models::{DeploymentStatus, LogTarget, TransitionEvent};

/// User-facing category of a build-completion transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failure,
    Cancelled,
}

/// A transition that should be surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub event: TransitionEvent,
    pub kind: NotificationKind,
}

/// Classify a transition. Only transitions leaving `Building` or `Deploying`
/// are build completions; everything else yields `None`.
pub fn classify(event: &TransitionEvent) -> Option<NotificationKind> {
    if !event.from.is_in_progress() {
        return None;
    }

    match event.to {
        DeploymentStatus::Success => Some(NotificationKind::Success),
        DeploymentStatus::Failed | DeploymentStatus::Crashed => Some(NotificationKind::Failure),
        DeploymentStatus::Cancelled => Some(NotificationKind::Cancelled),
        _ => None,
    }
}

impl Notification {
    /// Wrap an event if the policy considers it notification-worthy
    pub fn from_event(event: TransitionEvent) -> Option<Self> {
        classify(&event).map(|kind| Self { event, kind })
    }

    /// Log view offered alongside failure notifications
    pub fn log_target(&self) -> Option<LogTarget> {
        match self.kind {
            NotificationKind::Failure => Some(LogTarget::Deployment {
                deployment_id: self.event.deployment_id.clone(),
            }),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        let id = &self.event.deployment_id;
        match self.kind {
            NotificationKind::Success => format!("Deployment {} succeeded", id),
            NotificationKind::Failure => {
                format!("Deployment {} {}", id, self.event.to.as_str().to_lowercase())
            }
            NotificationKind::Cancelled => format!("Deployment {} was cancelled", id),
        }
    }
}
