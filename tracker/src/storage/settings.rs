//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Tracker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// GraphQL endpoint of the platform
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Deployment polling interval in seconds
    #[serde(default = "default_tree_poll_interval")]
    pub tree_poll_interval_secs: u64,

    /// Log view refresh interval in seconds
    #[serde(default = "default_log_poll_interval")]
    pub log_poll_interval_secs: u64,

    /// Most recent log lines fetched per refresh
    #[serde(default = "default_log_line_limit")]
    pub log_line_limit: usize,

    /// Deployments fetched per service and environment
    #[serde(default = "default_deployment_limit")]
    pub deployment_limit: usize,

    /// Whether log views refresh automatically when opened
    #[serde(default = "default_true")]
    pub auto_refresh_logs: bool,

    /// Enable local HTTP server
    #[serde(default = "default_true")]
    pub enable_socket_server: bool,

    /// Local HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://backboard.railway.app/graphql/v2".to_string()
}

fn default_tree_poll_interval() -> u64 {
    30
}

fn default_log_poll_interval() -> u64 {
    5
}

fn default_log_line_limit() -> usize {
    500
}

fn default_deployment_limit() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_dir: None,
            endpoint: default_endpoint(),
            tree_poll_interval_secs: default_tree_poll_interval(),
            log_poll_interval_secs: default_log_poll_interval(),
            log_line_limit: default_log_line_limit(),
            deployment_limit: default_deployment_limit(),
            auto_refresh_logs: true,
            enable_socket_server: true,
            server: ServerSettings::default(),
        }
    }
}

/// Local HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8787
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}
