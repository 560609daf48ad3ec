//! Platform resource models

pub mod deployment;
pub mod hierarchy;
pub mod log;

pub use deployment::{Deployment, DeploymentKey, DeploymentStatus, TransitionEvent};
pub use hierarchy::{Environment, HierarchyNode, NodeKind, Project, ResourceRef, Service};
pub use log::{LogLine, LogTarget, Severity};
