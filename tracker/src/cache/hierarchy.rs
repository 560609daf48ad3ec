//! Hierarchy cache

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::models::{Deployment, DeploymentKey, Environment, Project, Service};

/// Identifies one cached list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Projects,
    Environments(String),
    Services(String),
    Deployments(DeploymentKey),
}

#[derive(Debug, Default)]
struct Levels {
    projects: Option<Vec<Project>>,
    environments: HashMap<String, Vec<Environment>>,
    services: HashMap<String, Vec<Service>>,
    deployments: HashMap<DeploymentKey, Vec<Deployment>>,
}

/// Read-through cache of the project hierarchy.
///
/// A miss is reported as `None`; fetching and populating is up to the caller.
/// Entries are replaced wholesale and only ever cleared all at once.
#[derive(Debug, Default)]
pub struct HierarchyCache {
    levels: RwLock<Levels>,
    epoch: AtomicU64,
}

impl HierarchyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_projects(&self) -> Option<Vec<Project>> {
        let levels = self.levels.read().unwrap_or_else(|e| e.into_inner());
        levels.projects.clone()
    }

    pub fn put_projects(&self, projects: Vec<Project>) {
        let mut levels = self.levels.write().unwrap_or_else(|e| e.into_inner());
        levels.projects = Some(projects);
    }

    pub fn get_environments(&self, project_id: &str) -> Option<Vec<Environment>> {
        let levels = self.levels.read().unwrap_or_else(|e| e.into_inner());
        levels.environments.get(project_id).cloned()
    }

    pub fn put_environments(&self, project_id: &str, environments: Vec<Environment>) {
        let mut levels = self.levels.write().unwrap_or_else(|e| e.into_inner());
        levels.environments.insert(project_id.to_string(), environments);
    }

    pub fn get_services(&self, project_id: &str) -> Option<Vec<Service>> {
        let levels = self.levels.read().unwrap_or_else(|e| e.into_inner());
        levels.services.get(project_id).cloned()
    }

    pub fn put_services(&self, project_id: &str, services: Vec<Service>) {
        let mut levels = self.levels.write().unwrap_or_else(|e| e.into_inner());
        levels.services.insert(project_id.to_string(), services);
    }

    pub fn get_deployments(&self, key: &DeploymentKey) -> Option<Vec<Deployment>> {
        let levels = self.levels.read().unwrap_or_else(|e| e.into_inner());
        levels.deployments.get(key).cloned()
    }

    pub fn put_deployments(&self, key: DeploymentKey, deployments: Vec<Deployment>) {
        let mut levels = self.levels.write().unwrap_or_else(|e| e.into_inner());
        levels.deployments.insert(key, deployments);
    }

    /// Write projects only if the cache was not cleared since `epoch`.
    /// Returns whether the write happened.
    pub fn put_projects_at(&self, epoch: u64, projects: Vec<Project>) -> bool {
        self.write_at(epoch, |levels| levels.projects = Some(projects))
    }

    pub fn put_environments_at(
        &self,
        epoch: u64,
        project_id: &str,
        environments: Vec<Environment>,
    ) -> bool {
        self.write_at(epoch, |levels| {
            levels.environments.insert(project_id.to_string(), environments);
        })
    }

    pub fn put_services_at(&self, epoch: u64, project_id: &str, services: Vec<Service>) -> bool {
        self.write_at(epoch, |levels| {
            levels.services.insert(project_id.to_string(), services);
        })
    }

    pub fn put_deployments_at(
        &self,
        epoch: u64,
        key: DeploymentKey,
        deployments: Vec<Deployment>,
    ) -> bool {
        self.write_at(epoch, |levels| {
            levels.deployments.insert(key, deployments);
        })
    }

    /// The epoch is compared under the write lock, so a concurrent
    /// `clear_all` either lands before the check or after the write.
    fn write_at(&self, epoch: u64, write: impl FnOnce(&mut Levels)) -> bool {
        let mut levels = self.levels.write().unwrap_or_else(|e| e.into_inner());
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        write(&mut *levels);
        true
    }

    /// Whether a list is cached under `key`
    pub fn contains(&self, key: &CacheKey) -> bool {
        let levels = self.levels.read().unwrap_or_else(|e| e.into_inner());
        match key {
            CacheKey::Projects => levels.projects.is_some(),
            CacheKey::Environments(id) => levels.environments.contains_key(id),
            CacheKey::Services(id) => levels.services.contains_key(id),
            CacheKey::Deployments(k) => levels.deployments.contains_key(k),
        }
    }

    /// Every deployment bucket currently cached, in stable order
    pub fn deployment_keys(&self) -> Vec<DeploymentKey> {
        let levels = self.levels.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<_> = levels.deployments.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Empty every level at once
    pub fn clear_all(&self) {
        let mut levels = self.levels.write().unwrap_or_else(|e| e.into_inner());
        *levels = Levels::default();
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of `clear_all` calls so far
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Number of cached lists across all levels
    pub fn len(&self) -> usize {
        let levels = self.levels.read().unwrap_or_else(|e| e.into_inner());
        usize::from(levels.projects.is_some())
            + levels.environments.len()
            + levels.services.len()
            + levels.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
