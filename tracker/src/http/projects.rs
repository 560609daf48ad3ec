//! Project, environment and service queries

use serde_json::json;

use crate::errors::ApiError;
use crate::http::client::HttpClient;
use crate::http::graphql::nodes;
use crate::models::{Environment, Project, Service};

const PROJECTS_QUERY: &str = r#"
query projects {
  projects {
    edges { node { id name description createdAt updatedAt } }
  }
}"#;

const ENVIRONMENTS_QUERY: &str = r#"
query environments($projectId: String!) {
  environments(projectId: $projectId) {
    edges { node { id name projectId } }
  }
}"#;

const SERVICES_QUERY: &str = r#"
query services($projectId: String!) {
  project(id: $projectId) {
    services {
      edges { node { id name projectId } }
    }
  }
}"#;

impl HttpClient {
    /// List every project visible to the credential
    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        let data = self.query(PROJECTS_QUERY, json!({})).await?;
        nodes(&data, &["projects"])
    }

    /// List the environments of a project
    pub async fn get_environments(&self, project_id: &str) -> Result<Vec<Environment>, ApiError> {
        let data = self
            .query(ENVIRONMENTS_QUERY, json!({ "projectId": project_id }))
            .await?;
        nodes(&data, &["environments"])
    }

    /// List the services of a project
    pub async fn get_services(&self, project_id: &str) -> Result<Vec<Service>, ApiError> {
        let data = self
            .query(SERVICES_QUERY, json!({ "projectId": project_id }))
            .await?;
        nodes(&data, &["project", "services"])
    }
}
