//! Alert types and core trait definitions.

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Alert severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
    /// Critical.
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "INFO"),
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Error => write!(f, "ERROR"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl AlertSeverity {
    /// Lowercase name, as PagerDuty expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error => "error",
            AlertSeverity::Critical => "critical",
        }
    }

    /// Get color for Slack attachments.
    pub fn color(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "good",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error | AlertSeverity::Critical => "danger",
        }
    }
}

/// An alert raised for one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Human-readable description of the failure.
    pub message: String,
    /// Severity level.
    pub severity: AlertSeverity,
    /// Name of the endpoint the alert is about.
    pub source: String,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Additional key/value context.
    pub metadata: BTreeMap<String, String>,
}

impl Alert {
    /// Create a new alert.
    pub fn new(
        source: impl Into<String>,
        message: impl Into<String>,
        severity: AlertSeverity,
    ) -> Self {
        Self {
            message: message.into(),
            severity,
            source: source.into(),
            timestamp: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Single-line text form: `[ERROR] endpoint: message`.
    pub fn format_text(&self) -> String {
        format!("[{}] {}: {}", self.severity, self.source, self.message)
    }
}

/// A notification backend alerts can be raised through.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Channel name.
    fn name(&self) -> &str;

    /// Deliver one alert.
    async fn raise(&self, alert: &Alert) -> Result<(), MonitorError>;
}
