//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::dispatch::Dispatcher;
use crate::errors::TrackerError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::tree_poller;

/// Run the tracker until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    credential: Option<String>,
    dispatcher: Arc<dyn Dispatcher>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), TrackerError> {
    info!("Initializing railtrack...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(
        &options,
        credential,
        dispatcher,
        shutdown_tx.clone(),
        &mut shutdown_manager,
    )
    .await
    {
        error!("Failed to start tracker: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    credential: Option<String>,
    dispatcher: Arc<dyn Dispatcher>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, TrackerError> {
    let app_state = Arc::new(AppState::init(options, dispatcher)?);
    shutdown_manager.with_app_state(app_state.clone())?;

    match credential {
        Some(token) => app_state.tracker.set_credential(token),
        None => info!("No credential configured, waiting for one from the host"),
    }

    // Initial load of the tree
    let projects = app_state.tracker.refresh().await;
    info!("Loaded {} projects", projects.len());

    init_tree_poller(
        options.tree_poller.clone(),
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    if options.enable_socket_server {
        init_socket_server(
            options,
            app_state.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    Ok(app_state)
}

fn init_tree_poller(
    options: tree_poller::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), TrackerError> {
    info!("Initializing tree poller...");

    let tracker = app_state.tracker.clone();

    let poller_handle = tokio::spawn(async move {
        tree_poller::run(
            &options,
            tracker,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_tree_poller_handle(poller_handle)
}

async fn init_socket_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), TrackerError> {
    info!("Initializing local HTTP server...");

    let server_state = ServerState::new(app_state.tracker.clone());

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_socket_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
    socket_server_handle: Option<JoinHandle<Result<(), TrackerError>>>,
    tree_poller_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            app_state: None,
            socket_server_handle: None,
            tree_poller_handle: None,
        }
    }

    pub fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), TrackerError> {
        if self.app_state.is_some() {
            return Err(TrackerError::ShutdownError("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    pub fn with_tree_poller_handle(&mut self, handle: JoinHandle<()>) -> Result<(), TrackerError> {
        if self.tree_poller_handle.is_some() {
            return Err(TrackerError::ShutdownError("tree_poller_handle already set".to_string()));
        }
        self.tree_poller_handle = Some(handle);
        Ok(())
    }

    pub fn with_socket_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), TrackerError>>,
    ) -> Result<(), TrackerError> {
        if self.socket_server_handle.is_some() {
            return Err(TrackerError::ShutdownError("server_handle already set".to_string()));
        }
        self.socket_server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), TrackerError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), TrackerError> {
        info!("Shutting down railtrack...");

        // 1. Tree poller
        if let Some(handle) = self.tree_poller_handle.take() {
            handle.await.map_err(|e| TrackerError::ShutdownError(e.to_string()))?;
        }

        // 2. Socket server
        if let Some(handle) = self.socket_server_handle.take() {
            handle.await.map_err(|e| TrackerError::ShutdownError(e.to_string()))??;
        }

        // 3. App state (log view timer)
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown().await?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
