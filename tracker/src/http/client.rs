//! HTTP client implementation

use std::sync::RwLock;
use std::time::Duration;

use http::header;
use http::StatusCode;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::errors::{ApiError, TrackerError};
use crate::http::graphql::{into_data, GraphqlRequest, GraphqlResponse};

/// GraphQL client for the deployment platform
pub struct HttpClient {
    client: Client,
    endpoint: Url,
    credential: RwLock<Option<SecretString>>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(endpoint: &str) -> Result<Self, TrackerError> {
        Self::with_timeout(endpoint, Duration::from_secs(30))
    }

    /// Create a new HTTP client with a custom request timeout
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, TrackerError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| TrackerError::ConfigError(format!("Invalid endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("railtrack/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            credential: RwLock::new(None),
        })
    }

    /// Get the GraphQL endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Replace the bearer credential sent with every request
    pub fn set_credential(&self, token: String) {
        let mut credential = self.credential.write().unwrap_or_else(|e| e.into_inner());
        *credential = Some(SecretString::from(token));
    }

    /// Forget the bearer credential
    pub fn clear_credential(&self) {
        let mut credential = self.credential.write().unwrap_or_else(|e| e.into_inner());
        *credential = None;
    }

    pub fn has_credential(&self) -> bool {
        let credential = self.credential.read().unwrap_or_else(|e| e.into_inner());
        credential.is_some()
    }

    fn bearer(&self) -> Option<String> {
        let credential = self.credential.read().unwrap_or_else(|e| e.into_inner());
        credential
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    /// Execute a GraphQL query and return its `data` payload
    pub async fn query(&self, query: &str, variables: Value) -> Result<Value, ApiError> {
        debug!("POST {} ({})", self.endpoint, operation_name(query));

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&GraphqlRequest { query, variables });

        if let Some(bearer) = self.bearer() {
            request = request.header(header::AUTHORIZATION, bearer);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            error!("GraphQL request rejected: {} - {}", status, body);
            return Err(ApiError::Unauthorized(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("GraphQL request failed: {} - {}", status, body);
            return Err(ApiError::Unreachable(format!("{}: {}", status, body)));
        }

        let body = response.text().await?;
        let envelope: GraphqlResponse = serde_json::from_str(&body)?;
        into_data(envelope)
    }
}

/// First token after the `query` keyword, for log lines
fn operation_name(query: &str) -> &str {
    query
        .trim_start()
        .trim_start_matches("query")
        .trim_start()
        .split(|c: char| c == '(' || c == '{' || c.is_whitespace())
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("anonymous")
}
