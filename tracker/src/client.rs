//! Remote resource client: error policy on top of the platform API

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dispatch::{Dispatcher, TrackerEvent};
use crate::errors::ApiError;
use crate::http::PlatformApi;
use crate::models::{Deployment, DeploymentKey, Environment, LogLine, LogTarget, Project, Service};

/// Wraps a [`PlatformApi`] with the tracker's failure policy:
///
/// - malformed responses degrade to an empty list,
/// - a rejected credential is reported once and blocks every further call
///   until a new credential is set,
/// - transport failures are returned to the caller, who retries on its next tick.
pub struct ResourceClient {
    api: Arc<dyn PlatformApi>,
    dispatcher: Arc<dyn Dispatcher>,
    auth_blocked: AtomicBool,
}

impl ResourceClient {
    pub fn new(api: Arc<dyn PlatformApi>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            api,
            dispatcher,
            auth_blocked: AtomicBool::new(false),
        }
    }

    /// Whether calls are suspended after a credential rejection
    pub fn is_auth_blocked(&self) -> bool {
        self.auth_blocked.load(Ordering::SeqCst)
    }

    /// Install a new credential and lift any authorization block
    pub fn set_credential(&self, token: String) {
        self.api.set_credential(token);
        if self.auth_blocked.swap(false, Ordering::SeqCst) {
            info!("New credential installed, resuming platform requests");
        }
    }

    pub fn clear_credential(&self) {
        self.api.clear_credential();
        info!("Credential cleared");
    }

    fn ensure_authorized(&self) -> Result<(), ApiError> {
        if self.is_auth_blocked() {
            return Err(ApiError::Unauthorized(
                "credential was rejected, waiting for a new one".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_policy<T>(&self, what: &str, result: Result<Vec<T>, ApiError>) -> Result<Vec<T>, ApiError> {
        match result {
            Ok(items) => Ok(items),
            Err(ApiError::MalformedResponse(msg)) => {
                warn!("Malformed {} response, treating as empty: {}", what, msg);
                Ok(Vec::new())
            }
            Err(err @ ApiError::Unauthorized(_)) => {
                if !self.auth_blocked.swap(true, Ordering::SeqCst) {
                    error!("Credential rejected while fetching {}: {}", what, err);
                    self.dispatcher.dispatch(TrackerEvent::Error {
                        kind: err.kind(),
                        message: format!(
                            "The platform rejected the credential ({}). Set a new token to resume.",
                            err
                        ),
                    });
                }
                Err(err)
            }
            Err(err @ ApiError::Unreachable(_)) => {
                warn!("Failed to fetch {}: {}", what, err);
                Err(err)
            }
        }
    }

    pub async fn fetch_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.ensure_authorized()?;
        let result = self.api.fetch_projects().await;
        self.apply_policy("projects", result)
    }

    pub async fn fetch_environments(&self, project_id: &str) -> Result<Vec<Environment>, ApiError> {
        self.ensure_authorized()?;
        let result = self.api.fetch_environments(project_id).await;
        self.apply_policy("environments", result)
    }

    pub async fn fetch_services(&self, project_id: &str) -> Result<Vec<Service>, ApiError> {
        self.ensure_authorized()?;
        let result = self.api.fetch_services(project_id).await;
        self.apply_policy("services", result)
    }

    pub async fn fetch_deployments(
        &self,
        key: &DeploymentKey,
        limit: usize,
    ) -> Result<Vec<Deployment>, ApiError> {
        self.ensure_authorized()?;
        let result = self.api.fetch_deployments(key, limit).await;
        self.apply_policy("deployments", result)
    }

    /// Fetch logs; never fails. Total failure yields no lines and a warning.
    pub async fn fetch_logs(&self, target: &LogTarget, limit: usize) -> Vec<LogLine> {
        let result = match self.ensure_authorized() {
            Ok(()) => {
                let fetched = self.api.fetch_logs(target, limit).await;
                self.apply_policy("logs", fetched)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(lines) => lines,
            Err(ApiError::Unauthorized(_)) => Vec::new(),
            Err(e) => {
                self.dispatcher.dispatch(TrackerEvent::Warning {
                    message: format!("Could not load logs: {}", e),
                });
                Vec::new()
            }
        }
    }
}
