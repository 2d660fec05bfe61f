//! Builds one monitor per endpoint signal and runs them until shutdown.

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use nodewatch_config::{Config, EndpointConfig, EndpointKind};
use nodewatch_monitor::{
    AlertRouter, BlockNumberCheck, HealthCheck, Monitor, MonitorError, NodeClient,
    PeerCountCheck, SlotEventCheck, resolve_channels,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::DaemonError;

/// Creates node clients for endpoints.
pub trait ClientFactory: Send + Sync {
    fn connect(
        &self,
        endpoint: &EndpointConfig,
        timeout: Duration,
    ) -> Result<NodeClient, MonitorError>;
}

/// Real HTTP clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn connect(
        &self,
        endpoint: &EndpointConfig,
        timeout: Duration,
    ) -> Result<NodeClient, MonitorError> {
        NodeClient::connect(endpoint, timeout)
    }
}

/// `<kind>::<monitor>::<endpoint>`, e.g. `execution::BlockNumberMonitor::geth`.
pub fn monitor_name(kind: EndpointKind, monitor: &str, endpoint: &str) -> String {
    format!("{}::{}::{}", kind, monitor, endpoint)
}

/// Orchestrates every monitor of a configuration.
pub struct Supervisor {
    config: Arc<Config>,
    factory: Arc<dyn ClientFactory>,
}

impl Supervisor {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            factory: Arc::new(HttpClientFactory),
        }
    }

    /// Replace the client factory.
    pub fn with_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Build all monitors. Fails on the first endpoint whose client cannot be created.
    pub fn build(&self) -> Result<Vec<Monitor>, DaemonError> {
        let mut monitors = Vec::new();

        for endpoint in &self.config.endpoints {
            let client = self
                .factory
                .connect(endpoint, self.config.rpc_timeout)
                .map_err(|source| DaemonError::Connect {
                    endpoint: endpoint.name.clone(),
                    source,
                })?;

            let bindings = resolve_channels(endpoint, &self.config);
            if bindings.is_empty() {
                warn!(
                    endpoint = %endpoint.name,
                    "no alert channel configured, failures will only be logged"
                );
            } else {
                debug!(
                    endpoint = %endpoint.name,
                    channels = ?bindings.iter().map(|b| b.describe()).collect::<Vec<_>>(),
                    "resolved alert channels"
                );
            }
            let router = AlertRouter::from_bindings(&bindings);

            monitors.extend(Self::monitors_for(endpoint, client, router));
        }

        Ok(monitors)
    }

    fn monitors_for(
        endpoint: &EndpointConfig,
        client: NodeClient,
        router: AlertRouter,
    ) -> Vec<Monitor> {
        let kind = client.kind();
        let monitor = |label: &str, check: Box<dyn HealthCheck>| {
            Monitor::new(
                monitor_name(kind, label, &endpoint.name),
                endpoint.name.clone(),
                endpoint.poll_duration,
                check,
                router.clone(),
            )
        };

        let mut monitors = Vec::new();
        match client {
            NodeClient::Execution(api) => {
                monitors.push(monitor(
                    "BlockNumberMonitor",
                    Box::new(BlockNumberCheck::new(
                        api.clone(),
                        endpoint.new_block_max_duration,
                    )),
                ));
                if endpoint.monitors_peers() {
                    monitors.push(monitor(
                        "PeerCountMonitor",
                        Box::new(PeerCountCheck::new(api, endpoint.min_peers)),
                    ));
                }
            }
            NodeClient::Consensus(api) => {
                monitors.push(monitor(
                    "BlockMonitor",
                    Box::new(SlotEventCheck::new(
                        api.clone(),
                        endpoint.new_block_max_duration,
                    )),
                ));
                if endpoint.monitors_peers() {
                    monitors.push(monitor(
                        "PeerCountMonitor",
                        Box::new(PeerCountCheck::new(api, endpoint.min_peers)),
                    ));
                }
            }
        }
        monitors
    }

    /// Run every monitor until `shutdown` is cancelled. A monitor failing on
    /// its own stops all others and is returned as the error.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), DaemonError> {
        let monitors = self.build()?;
        if monitors.is_empty() {
            warn!("no monitors configured, nothing to do");
            return Ok(());
        }

        let cancel = shutdown.child_token();
        let mut tasks = JoinSet::new();
        for monitor in monitors {
            info!(
                monitor = %monitor.name(),
                endpoint = %monitor.endpoint(),
                interval = ?monitor.poll_interval(),
                "starting monitor"
            );
            let name = monitor.name().to_string();
            let token = cancel.clone();
            tasks.spawn(async move { (name, monitor.run(token).await) });
        }
        info!(monitors = tasks.len(), "all monitors started");

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((_, Ok(()))) => None,
                Ok((name, Err(source))) => Some(DaemonError::MonitorFailed { name, source }),
                Err(e) => Some(DaemonError::TaskPanicked(e.to_string())),
            };

            if let Some(err) = failure {
                error!(error = %err, "monitor terminated, stopping all monitors");
                cancel.cancel();
                first_error.get_or_insert(err);
            }
        }

        info!("all monitors stopped");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
