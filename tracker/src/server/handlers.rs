//! HTTP request handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{HierarchyNode, LogTarget, ResourceRef};
use crate::server::state::ServerState;
use crate::tracker::TickStats;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub authorized: bool,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "railtrack".to_string(),
        version: version_info().version,
        authorized: !state.tracker.client().is_auth_blocked(),
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

/// A tree node as rendered by the host
#[derive(Debug, Serialize)]
pub struct NodeResponse {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub resource: ResourceRef,
    pub node: HierarchyNode,
}

impl From<HierarchyNode> for NodeResponse {
    fn from(node: HierarchyNode) -> Self {
        Self {
            id: node.id().to_string(),
            label: node.label(),
            description: node.description(),
            resource: node.to_ref(),
            node,
        }
    }
}

fn to_responses(nodes: Vec<HierarchyNode>) -> Json<Vec<NodeResponse>> {
    Json(nodes.into_iter().map(NodeResponse::from).collect())
}

/// Project list handler
pub async fn projects_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let projects = state.tracker.projects().await;
    to_responses(projects.into_iter().map(HierarchyNode::Project).collect())
}

/// Full refresh handler
pub async fn refresh_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    to_responses(state.tracker.refresh().await)
}

/// Child listing handler
pub async fn select_handler(
    State(state): State<Arc<ServerState>>,
    Json(resource): Json<ResourceRef>,
) -> impl IntoResponse {
    to_responses(state.tracker.select_resource(&resource).await)
}

/// Poll tick counters handler
pub async fn stats_handler(State(state): State<Arc<ServerState>>) -> Json<TickStats> {
    Json(state.tracker.tick_stats())
}

/// Log view response
#[derive(Debug, Serialize)]
pub struct LogViewResponse {
    pub view_id: Option<Uuid>,
    pub target: Option<LogTarget>,
    pub auto_refresh: bool,
}

/// Open log view handler
pub async fn open_logs_handler(
    State(state): State<Arc<ServerState>>,
    Json(target): Json<LogTarget>,
) -> impl IntoResponse {
    let view_id = state.tracker.open_log_view(target).await;
    Json(LogViewResponse {
        view_id: Some(view_id),
        target: state.tracker.log_view().current(),
        auto_refresh: state.tracker.log_view().auto_refresh(),
    })
}

/// Auto-refresh toggle handler
pub async fn auto_refresh_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let auto_refresh = state.tracker.toggle_auto_refresh();
    Json(LogViewResponse {
        view_id: None,
        target: state.tracker.log_view().current(),
        auto_refresh,
    })
}

/// Close log view handler
pub async fn close_logs_handler(State(state): State<Arc<ServerState>>) -> StatusCode {
    state.tracker.close_log_view();
    StatusCode::NO_CONTENT
}

/// Credential request
#[derive(Deserialize)]
pub struct CredentialRequest {
    pub token: String,
}

/// Set credential handler
pub async fn set_credential_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<CredentialRequest>,
) -> Result<StatusCode, StatusCode> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    state.tracker.set_credential(token.to_string());
    Ok(StatusCode::NO_CONTENT)
}

/// Clear credential handler
pub async fn clear_credential_handler(State(state): State<Arc<ServerState>>) -> StatusCode {
    state.tracker.clear_credential();
    StatusCode::NO_CONTENT
}
