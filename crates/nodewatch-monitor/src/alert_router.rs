//! Alert router for dispatching alerts to every resolved channel.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error};

use crate::error::MonitorError;
use crate::resolver::ChannelBinding;

use super::alerts::{Alert, AlertChannel};

/// Outcome of one `raise_all` call.
#[derive(Debug, Default)]
pub struct AlertReport {
    /// Number of channels invoked.
    pub attempted: usize,
    /// Channel name and error for every failed delivery.
    pub failures: Vec<(String, MonitorError)>,
}

impl AlertReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fans an alert out to a fixed set of channels. Delivery is best effort:
/// every channel is tried, failures are logged and reported, never retried.
#[derive(Clone, Default)]
pub struct AlertRouter {
    channels: Vec<Arc<dyn AlertChannel>>,
}

impl AlertRouter {
    /// Create a router over the given channels.
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>) -> Self {
        Self { channels }
    }

    /// Build the concrete channels for resolved bindings.
    pub fn from_bindings(bindings: &[ChannelBinding]) -> Self {
        Self::new(bindings.iter().map(ChannelBinding::build).collect())
    }

    /// Get list of channel names.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Raise an alert on all channels concurrently.
    pub async fn raise_all(&self, alert: &Alert) -> AlertReport {
        if self.channels.is_empty() {
            debug!(endpoint = %alert.source, "no alert channels configured, alert only logged");
            return AlertReport::default();
        }

        let deliveries = self.channels.iter().map(|channel| async move {
            (channel.name().to_string(), channel.raise(alert).await)
        });

        let mut report = AlertReport {
            attempted: self.channels.len(),
            failures: Vec::new(),
        };

        for (name, result) in join_all(deliveries).await {
            if let Err(e) = result {
                error!(
                    channel = %name,
                    endpoint = %alert.source,
                    error = %e,
                    "failed to raise alert"
                );
                report.failures.push((name, e));
            }
        }

        report
    }
}
