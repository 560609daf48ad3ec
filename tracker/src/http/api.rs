//! Platform API seam

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::http::client::HttpClient;
use crate::models::{Deployment, DeploymentKey, Environment, LogLine, LogTarget, Project, Service};

/// Remote resource operations, abstracted for testability.
///
/// Implementations return the remote ordering untouched and classify every
/// failure as an [`ApiError`]. An empty list is a valid result.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn fetch_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn fetch_environments(&self, project_id: &str) -> Result<Vec<Environment>, ApiError>;

    async fn fetch_services(&self, project_id: &str) -> Result<Vec<Service>, ApiError>;

    async fn fetch_deployments(
        &self,
        key: &DeploymentKey,
        limit: usize,
    ) -> Result<Vec<Deployment>, ApiError>;

    async fn fetch_logs(&self, target: &LogTarget, limit: usize) -> Result<Vec<LogLine>, ApiError>;

    /// Replace the credential used for subsequent requests
    fn set_credential(&self, token: String);

    /// Drop the credential
    fn clear_credential(&self);
}

#[async_trait]
impl PlatformApi for HttpClient {
    async fn fetch_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_projects().await
    }

    async fn fetch_environments(&self, project_id: &str) -> Result<Vec<Environment>, ApiError> {
        self.get_environments(project_id).await
    }

    async fn fetch_services(&self, project_id: &str) -> Result<Vec<Service>, ApiError> {
        self.get_services(project_id).await
    }

    async fn fetch_deployments(
        &self,
        key: &DeploymentKey,
        limit: usize,
    ) -> Result<Vec<Deployment>, ApiError> {
        self.get_deployments(key, limit).await
    }

    async fn fetch_logs(&self, target: &LogTarget, limit: usize) -> Result<Vec<LogLine>, ApiError> {
        self.get_logs(target, limit).await
    }

    fn set_credential(&self, token: String) {
        HttpClient::set_credential(self, token)
    }

    fn clear_credential(&self) {
        HttpClient::clear_credential(self)
    }
}
