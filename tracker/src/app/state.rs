//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::dispatch::Dispatcher;
use crate::errors::TrackerError;
use crate::http::client::HttpClient;
use crate::tracker::Tracker;

/// Main application state
pub struct AppState {
    /// GraphQL client for the platform
    pub http_client: Arc<HttpClient>,

    /// Deployment tracker
    pub tracker: Arc<Tracker>,
}

impl AppState {
    /// Initialize application state
    pub fn init(options: &AppOptions, dispatcher: Arc<dyn Dispatcher>) -> Result<Self, TrackerError> {
        info!("Initializing application state...");

        let http_client = Arc::new(HttpClient::new(&options.endpoint)?);
        let tracker = Arc::new(Tracker::new(
            http_client.clone(),
            dispatcher,
            options.tracker.clone(),
        ));

        Ok(Self {
            http_client,
            tracker,
        })
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), TrackerError> {
        info!("Shutting down application state...");
        self.tracker.shutdown().await;
        Ok(())
    }
}
