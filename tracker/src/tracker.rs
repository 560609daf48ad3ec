//! Deployment tracker: the state that polling, selection and refresh act upon

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheKey, HierarchyCache};
use crate::client::ResourceClient;
use crate::detect::{Notification, TransitionDetector};
use crate::dispatch::{Dispatcher, TrackerEvent};
use crate::errors::ApiError;
use crate::http::PlatformApi;
use crate::models::{
    Deployment, DeploymentKey, DeploymentStatus, Environment, HierarchyNode, LogTarget, Project,
    ResourceRef, Service,
};
use crate::workers::log_poller::{self, LogViewSlot};

/// Tracker options
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Deployments fetched per service/environment bucket
    pub deployment_limit: usize,

    /// Log view options
    pub log_view: log_poller::Options,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            deployment_limit: 10,
            log_view: log_poller::Options::default(),
        }
    }
}

/// Result of one tree poll tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still in flight
    Skipped,
    Completed(TickSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Deployment buckets polled
    pub buckets: usize,
    /// Buckets whose fetch failed
    pub failed: usize,
    /// Buckets whose result was dropped because the cache was cleared meanwhile
    pub discarded: usize,
    /// Status transitions observed
    pub transitions: usize,
}

/// Tick counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickStats {
    pub started: u64,
    pub completed: u64,
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct TickCounters {
    started: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
}

/// Clears the in-flight flag when a tick ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Deployment tracker
pub struct Tracker {
    client: Arc<ResourceClient>,
    cache: HierarchyCache,
    detector: Mutex<TransitionDetector>,
    dispatcher: Arc<dyn Dispatcher>,
    fetch_locks: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    tick_in_flight: AtomicBool,
    ticks: TickCounters,
    log_view: LogViewSlot,
    deployment_limit: usize,
}

impl Tracker {
    /// Create a new tracker
    pub fn new(
        api: Arc<dyn PlatformApi>,
        dispatcher: Arc<dyn Dispatcher>,
        options: TrackerOptions,
    ) -> Self {
        let client = Arc::new(ResourceClient::new(api, dispatcher.clone()));
        let log_view = LogViewSlot::new(options.log_view, client.clone(), dispatcher.clone());

        Self {
            client,
            cache: HierarchyCache::new(),
            detector: Mutex::new(TransitionDetector::new()),
            dispatcher,
            fetch_locks: Mutex::new(HashMap::new()),
            tick_in_flight: AtomicBool::new(false),
            ticks: TickCounters::default(),
            log_view,
            deployment_limit: options.deployment_limit,
        }
    }

    pub fn cache(&self) -> &HierarchyCache {
        &self.cache
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    /// Last status seen for a deployment
    pub fn last_status(&self, deployment_id: &str) -> Option<DeploymentStatus> {
        let detector = self.detector.lock().unwrap_or_else(|e| e.into_inner());
        detector.last_status(deployment_id)
    }

    // ============================== CREDENTIAL ================================ //

    pub fn set_credential(&self, token: String) {
        self.client.set_credential(token);
    }

    pub fn clear_credential(&self) {
        self.client.clear_credential();
    }

    // ============================== HIERARCHY ================================= //

    /// Drop every cached level and reload the project list
    pub async fn refresh(&self) -> Vec<HierarchyNode> {
        info!("Refreshing hierarchy...");
        self.cache.clear_all();

        let projects = self.projects().await;
        self.dispatcher.dispatch(TrackerEvent::HierarchyChanged);

        projects.into_iter().map(HierarchyNode::Project).collect()
    }

    /// Project list, fetched on a cache miss
    pub async fn projects(&self) -> Vec<Project> {
        self.read_through(
            CacheKey::Projects,
            || self.cache.get_projects(),
            || self.client.fetch_projects(),
            |epoch, projects| self.cache.put_projects_at(epoch, projects),
        )
        .await
    }

    pub async fn environments(&self, project_id: &str) -> Vec<Environment> {
        self.read_through(
            CacheKey::Environments(project_id.to_string()),
            || self.cache.get_environments(project_id),
            || self.client.fetch_environments(project_id),
            |epoch, environments| {
                self.cache.put_environments_at(epoch, project_id, environments)
            },
        )
        .await
    }

    pub async fn services(&self, project_id: &str) -> Vec<Service> {
        self.read_through(
            CacheKey::Services(project_id.to_string()),
            || self.cache.get_services(project_id),
            || self.client.fetch_services(project_id),
            |epoch, services| self.cache.put_services_at(epoch, project_id, services),
        )
        .await
    }

    /// Deployments of a bucket. Freshly fetched deployments are observed so
    /// later polls can detect their transitions.
    pub async fn deployments(&self, key: &DeploymentKey) -> Vec<Deployment> {
        self.read_through(
            CacheKey::Deployments(key.clone()),
            || self.cache.get_deployments(key),
            || self.client.fetch_deployments(key, self.deployment_limit),
            |epoch, deployments| {
                let written = self.cache.put_deployments_at(epoch, key.clone(), deployments.clone());
                if written {
                    self.observe_and_notify(&deployments);
                }
                written
            },
        )
        .await
    }

    /// Children of the selected resource
    pub async fn select_resource(&self, resource: &ResourceRef) -> Vec<HierarchyNode> {
        debug!("Selected {:?}", resource);
        match resource {
            ResourceRef::Project { project_id } => {
                // Services are shown under every environment; load them alongside
                let (environments, _) =
                    futures::join!(self.environments(project_id), self.services(project_id));
                environments.into_iter().map(HierarchyNode::Environment).collect()
            }
            ResourceRef::Environment {
                project_id,
                environment_id,
            } => self
                .services(project_id)
                .await
                .into_iter()
                .map(|service| HierarchyNode::Service {
                    service,
                    environment_id: environment_id.clone(),
                })
                .collect(),
            ResourceRef::Service {
                service_id,
                environment_id,
            } => {
                let key = DeploymentKey::new(service_id, environment_id);
                self.deployments(&key)
                    .await
                    .into_iter()
                    .map(HierarchyNode::Deployment)
                    .collect()
            }
            ResourceRef::Deployment { .. } => Vec::new(),
        }
    }

    /// Serve `key` from cache, or fetch and populate it. Concurrent misses on
    /// the same key share one fetch; a failed fetch leaves the cache untouched.
    /// A result arriving after `clear_all` is handed back but not cached.
    async fn read_through<T, G, F, Fut, P>(&self, key: CacheKey, get: G, fetch: F, put: P) -> Vec<T>
    where
        T: Clone,
        G: Fn() -> Option<Vec<T>>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
        P: FnOnce(u64, Vec<T>) -> bool,
    {
        if let Some(hit) = get() {
            return hit;
        }

        let lock = self.fetch_lock(&key);
        let result = {
            let _guard = lock.lock().await;
            match get() {
                Some(hit) => hit,
                None => {
                    let epoch = self.cache.epoch();
                    match fetch().await {
                        Ok(items) => {
                            if !put(epoch, items.clone()) {
                                debug!("Cache cleared while fetching {:?}, not caching", key);
                            }
                            items
                        }
                        Err(e) => {
                            debug!("Nothing cached for {:?} after failed fetch: {}", key, e);
                            Vec::new()
                        }
                    }
                }
            }
        };
        self.release_fetch_lock(&key, lock);
        result
    }

    fn fetch_lock(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.fetch_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key.clone()).or_default().clone()
    }

    fn release_fetch_lock(&self, key: &CacheKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.fetch_locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one held here: nobody else is waiting
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(key);
        }
    }

    /// Run the detector over `deployments` and dispatch the notification-worthy
    /// transitions. Returns the number of transitions seen.
    fn observe_and_notify(&self, deployments: &[Deployment]) -> usize {
        let events = {
            let mut detector = self.detector.lock().unwrap_or_else(|e| e.into_inner());
            detector.observe_all(deployments)
        };

        let count = events.len();
        for event in events {
            info!(
                "Deployment {} changed status: {} -> {}",
                event.deployment_id, event.from, event.to
            );
            if let Some(notification) = Notification::from_event(event) {
                self.dispatcher.dispatch(TrackerEvent::Transition(notification));
            }
        }
        count
    }

    // ================================ POLLING ================================= //

    /// Re-fetch every cached deployment bucket and report transitions.
    ///
    /// Skipped outright if the previous tick is still running.
    pub async fn poll_tick(&self) -> TickOutcome {
        if self
            .tick_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.ticks.skipped.fetch_add(1, Ordering::SeqCst);
            debug!("Previous poll tick still in flight, skipping");
            return TickOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.tick_in_flight);
        self.ticks.started.fetch_add(1, Ordering::SeqCst);

        let summary = self.poll_tick_impl().await;

        self.ticks.completed.fetch_add(1, Ordering::SeqCst);
        TickOutcome::Completed(summary)
    }

    async fn poll_tick_impl(&self) -> TickSummary {
        if self.client.is_auth_blocked() {
            debug!("Credential rejected, not polling until it is replaced");
            return TickSummary::default();
        }

        let epoch = self.cache.epoch();
        let keys = self.cache.deployment_keys();
        let mut summary = TickSummary {
            buckets: keys.len(),
            ..Default::default()
        };

        for key in keys {
            match self.client.fetch_deployments(&key, self.deployment_limit).await {
                Ok(deployments) => {
                    if !self.cache.put_deployments_at(epoch, key.clone(), deployments.clone()) {
                        debug!("Cache cleared during tick, discarding deployments of {}", key);
                        summary.discarded += 1;
                        continue;
                    }
                    summary.transitions += self.observe_and_notify(&deployments);
                }
                Err(e) => {
                    summary.failed += 1;
                    if e.is_unauthorized() {
                        break;
                    }
                }
            }
        }

        if summary.failed > 0 {
            warn!(
                "Poll tick: {} of {} buckets failed, showing cached state",
                summary.failed, summary.buckets
            );
        }
        self.dispatcher.dispatch(TrackerEvent::HierarchyChanged);
        summary
    }

    pub fn tick_stats(&self) -> TickStats {
        TickStats {
            started: self.ticks.started.load(Ordering::SeqCst),
            completed: self.ticks.completed.load(Ordering::SeqCst),
            skipped: self.ticks.skipped.load(Ordering::SeqCst),
        }
    }

    // ================================ LOG VIEW ================================ //

    pub async fn open_log_view(&self, target: LogTarget) -> Uuid {
        self.log_view.open(target).await
    }

    pub fn toggle_auto_refresh(&self) -> bool {
        self.log_view.toggle_auto_refresh()
    }

    pub fn close_log_view(&self) {
        self.log_view.close()
    }

    pub fn log_view(&self) -> &LogViewSlot {
        &self.log_view
    }

    /// Stop the log timer and wait for it
    pub async fn shutdown(&self) {
        info!("Shutting down tracker...");
        self.log_view.shutdown().await;
    }
}
