//! Deployment models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deployment status as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Building,
    Deploying,
    Success,
    Failed,
    Cancelled,
    Crashed,
    Removed,
    Removing,
}

impl DeploymentStatus {
    /// Whether the deployment is still being built or rolled out
    pub fn is_in_progress(&self) -> bool {
        matches!(self, DeploymentStatus::Building | DeploymentStatus::Deploying)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Building => "BUILDING",
            DeploymentStatus::Deploying => "DEPLOYING",
            DeploymentStatus::Success => "SUCCESS",
            DeploymentStatus::Failed => "FAILED",
            DeploymentStatus::Cancelled => "CANCELLED",
            DeploymentStatus::Crashed => "CRASHED",
            DeploymentStatus::Removed => "REMOVED",
            DeploymentStatus::Removing => "REMOVING",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployment snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Globally unique deployment ID
    pub id: String,

    /// Current status
    pub status: DeploymentStatus,

    /// Public URL, if the service exposes one
    #[serde(default)]
    pub static_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub service_id: String,
    pub environment_id: String,
}

impl Deployment {
    /// The bucket this deployment is listed under
    pub fn key(&self) -> DeploymentKey {
        DeploymentKey::new(&self.service_id, &self.environment_id)
    }
}

/// Composite key of a deployment list: one service within one environment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentKey {
    pub service_id: String,
    pub environment_id: String,
}

impl DeploymentKey {
    pub fn new(service_id: impl Into<String>, environment_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            environment_id: environment_id.into(),
        }
    }
}

impl fmt::Display for DeploymentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.service_id, self.environment_id)
    }
}

/// A change of a deployment's status between two consecutive observations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub deployment_id: String,
    pub from: DeploymentStatus,
    pub to: DeploymentStatus,
}
