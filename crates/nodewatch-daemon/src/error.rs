//! Daemon-related errors.

use nodewatch_config::ConfigError;
use nodewatch_monitor::MonitorError;
use thiserror::Error;

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A node client could not be built for an endpoint.
    #[error("Failed to set up endpoint {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: MonitorError,
    },

    /// A monitor stopped with an unrecoverable error.
    #[error("Monitor {name} failed: {source}")]
    MonitorFailed {
        name: String,
        #[source]
        source: MonitorError,
    },

    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// A monitor task panicked or was aborted.
    #[error("Monitor task panicked: {0}")]
    TaskPanicked(String),
}
