//! Log line models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Map a platform severity string, falling back to `Info` for anything unknown
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "warn" | "warning" => Severity::Warning,
            "err" | "error" | "fatal" => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Severity::parse_lenient).unwrap_or_default())
    }
}

/// One line of deployment output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub severity: Severity,
}

/// The resource whose logs are viewed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogTarget {
    /// A specific deployment
    #[serde(rename_all = "camelCase")]
    Deployment { deployment_id: String },

    /// Whatever deployment is newest for a service in an environment
    #[serde(rename_all = "camelCase")]
    Service {
        service_id: String,
        environment_id: String,
    },
}
