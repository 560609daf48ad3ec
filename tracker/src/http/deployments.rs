//! Deployment queries

use serde_json::json;

use crate::errors::ApiError;
use crate::http::client::HttpClient;
use crate::http::graphql::nodes;
use crate::models::{Deployment, DeploymentKey};

const DEPLOYMENTS_QUERY: &str = r#"
query deployments($first: Int, $input: DeploymentListInput!) {
  deployments(first: $first, input: $input) {
    edges {
      node { id status staticUrl createdAt updatedAt serviceId environmentId }
    }
  }
}"#;

impl HttpClient {
    /// List the most recent deployments of a service in an environment, newest first
    pub async fn get_deployments(
        &self,
        key: &DeploymentKey,
        limit: usize,
    ) -> Result<Vec<Deployment>, ApiError> {
        let variables = json!({
            "first": limit,
            "input": {
                "serviceId": key.service_id,
                "environmentId": key.environment_id,
            }
        });
        let data = self.query(DEPLOYMENTS_QUERY, variables).await?;
        nodes(&data, &["deployments"])
    }
}
