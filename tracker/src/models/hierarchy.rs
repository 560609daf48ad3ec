//! Project, environment and service models, plus the tree nodes handed to the host UI

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::deployment::Deployment;

/// A platform project, root of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An environment within a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub project_id: String,
}

/// A service within a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub project_id: String,
}

/// Hierarchy level of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Project,
    Environment,
    Service,
    Deployment,
}

/// Reference to a selectable resource in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceRef {
    #[serde(rename_all = "camelCase")]
    Project { project_id: String },

    #[serde(rename_all = "camelCase")]
    Environment {
        project_id: String,
        environment_id: String,
    },

    /// Services are listed per project but their deployments per environment
    #[serde(rename_all = "camelCase")]
    Service {
        service_id: String,
        environment_id: String,
    },

    #[serde(rename_all = "camelCase")]
    Deployment { deployment_id: String },
}

impl ResourceRef {
    pub fn kind(&self) -> NodeKind {
        match self {
            ResourceRef::Project { .. } => NodeKind::Project,
            ResourceRef::Environment { .. } => NodeKind::Environment,
            ResourceRef::Service { .. } => NodeKind::Service,
            ResourceRef::Deployment { .. } => NodeKind::Deployment,
        }
    }
}

/// A node of the rendered hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "item", rename_all = "lowercase")]
pub enum HierarchyNode {
    Project(Project),
    Environment(Environment),
    #[serde(rename_all = "camelCase")]
    Service {
        service: Service,
        environment_id: String,
    },
    Deployment(Deployment),
}

impl HierarchyNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            HierarchyNode::Project(_) => NodeKind::Project,
            HierarchyNode::Environment(_) => NodeKind::Environment,
            HierarchyNode::Service { .. } => NodeKind::Service,
            HierarchyNode::Deployment(_) => NodeKind::Deployment,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            HierarchyNode::Project(p) => &p.id,
            HierarchyNode::Environment(e) => &e.id,
            HierarchyNode::Service { service, .. } => &service.id,
            HierarchyNode::Deployment(d) => &d.id,
        }
    }

    /// Primary text of the node
    pub fn label(&self) -> String {
        match self {
            HierarchyNode::Project(p) => p.name.clone(),
            HierarchyNode::Environment(e) => e.name.clone(),
            HierarchyNode::Service { service, .. } => service.name.clone(),
            HierarchyNode::Deployment(d) => format!(
                "{} ({})",
                d.status,
                d.created_at.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }

    /// Secondary text of the node
    pub fn description(&self) -> Option<String> {
        match self {
            HierarchyNode::Project(p) => p.description.clone(),
            HierarchyNode::Deployment(d) => d.static_url.clone(),
            _ => None,
        }
    }

    /// Reference used to select this node and expand its children
    pub fn to_ref(&self) -> ResourceRef {
        match self {
            HierarchyNode::Project(p) => ResourceRef::Project {
                project_id: p.id.clone(),
            },
            HierarchyNode::Environment(e) => ResourceRef::Environment {
                project_id: e.project_id.clone(),
                environment_id: e.id.clone(),
            },
            HierarchyNode::Service {
                service,
                environment_id,
            } => ResourceRef::Service {
                service_id: service.id.clone(),
                environment_id: environment_id.clone(),
            },
            HierarchyNode::Deployment(d) => ResourceRef::Deployment {
                deployment_id: d.id.clone(),
            },
        }
    }
}
