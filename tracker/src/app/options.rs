//! Application configuration options

use std::time::Duration;

use crate::storage::settings::Settings;
use crate::tracker::TrackerOptions;
use crate::workers::{log_poller, tree_poller};

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// GraphQL endpoint of the platform
    pub endpoint: String,

    /// Enable local HTTP server
    pub enable_socket_server: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Tree poller worker options
    pub tree_poller: tree_poller::Options,

    /// Tracker options
    pub tracker: TrackerOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AppOptions {
    /// Derive options from the settings file
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            endpoint: settings.endpoint.clone(),
            enable_socket_server: settings.enable_socket_server,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            tree_poller: tree_poller::Options {
                interval: Duration::from_secs(settings.tree_poll_interval_secs.max(1)),
            },
            tracker: TrackerOptions {
                deployment_limit: settings.deployment_limit.max(1),
                log_view: log_poller::Options {
                    interval: Duration::from_secs(settings.log_poll_interval_secs.max(1)),
                    line_limit: settings.log_line_limit,
                    auto_refresh: settings.auto_refresh_logs,
                },
            },
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}
