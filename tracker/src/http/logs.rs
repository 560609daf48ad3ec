//! Deployment log queries

use serde_json::json;
use tracing::debug;

use crate::errors::ApiError;
use crate::http::client::HttpClient;
use crate::http::graphql::list;
use crate::models::{DeploymentKey, LogLine, LogTarget};

const DEPLOYMENT_LOGS_QUERY: &str = r#"
query deploymentLogs($deploymentId: String!, $limit: Int) {
  deploymentLogs(deploymentId: $deploymentId, limit: $limit) {
    message timestamp severity
  }
}"#;

impl HttpClient {
    /// Fetch the most recent `limit` log lines of a deployment
    pub async fn get_deployment_logs(
        &self,
        deployment_id: &str,
        limit: usize,
    ) -> Result<Vec<LogLine>, ApiError> {
        let variables = json!({ "deploymentId": deployment_id, "limit": limit });
        let data = self.query(DEPLOYMENT_LOGS_QUERY, variables).await?;
        list(&data, &["deploymentLogs"])
    }

    /// Fetch logs for a target, resolving a service target to its newest deployment
    pub async fn get_logs(&self, target: &LogTarget, limit: usize) -> Result<Vec<LogLine>, ApiError> {
        match target {
            LogTarget::Deployment { deployment_id } => {
                self.get_deployment_logs(deployment_id, limit).await
            }
            LogTarget::Service {
                service_id,
                environment_id,
            } => {
                let key = DeploymentKey::new(service_id, environment_id);
                let latest = self.get_deployments(&key, 1).await?;
                match latest.first() {
                    Some(deployment) => self.get_deployment_logs(&deployment.id, limit).await,
                    None => {
                        debug!("No deployment for {}, no logs to fetch", key);
                        Ok(Vec::new())
                    }
                }
            }
        }
    }
}
