//! Data sources the health checks sample.
//!
//! Execution nodes are polled over JSON-RPC, consensus nodes push block events
//! over the beacon event stream and are polled for peers.

mod consensus;
mod execution;
mod sse;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nodewatch_config::{EndpointConfig, EndpointKind};
use tokio_util::sync::CancellationToken;

use crate::error::MonitorError;

pub use consensus::BeaconClient;
pub use execution::ExecutionClient;
pub use sse::{SseDecoder, SseEvent};

/// Callback invoked with every observed block height or slot.
pub type BlockHandler = Arc<dyn Fn(u64) + Send + Sync>;

/// Pull-based latest block height.
#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn latest_height(&self) -> Result<u64, MonitorError>;
}

/// Current number of connected peers.
#[async_trait]
pub trait PeerSource: Send + Sync {
    async fn peer_count(&self) -> Result<u64, MonitorError>;
}

/// Push-based block notifications.
#[async_trait]
pub trait BlockSubscription: Send + Sync {
    /// Deliver every block to `on_block` until cancelled (`Ok`) or the
    /// stream fails or ends (`Err`).
    async fn subscribe_blocks(
        &self,
        cancel: CancellationToken,
        on_block: BlockHandler,
    ) -> Result<(), MonitorError>;
}

/// Everything an execution endpoint provides.
pub trait ExecutionApi: BlockSource + PeerSource {}

impl<T: BlockSource + PeerSource> ExecutionApi for T {}

/// Everything a consensus endpoint provides.
pub trait ConsensusApi: BlockSubscription + PeerSource {}

impl<T: BlockSubscription + PeerSource> ConsensusApi for T {}

/// A connected client for one endpoint.
#[derive(Clone)]
pub enum NodeClient {
    Execution(Arc<dyn ExecutionApi>),
    Consensus(Arc<dyn ConsensusApi>),
}

impl NodeClient {
    /// Build the HTTP client matching the endpoint kind.
    pub fn connect(endpoint: &EndpointConfig, timeout: Duration) -> Result<Self, MonitorError> {
        match endpoint.kind {
            EndpointKind::Execution => Ok(NodeClient::Execution(Arc::new(
                ExecutionClient::new(&endpoint.url, timeout)?,
            ))),
            EndpointKind::Consensus => Ok(NodeClient::Consensus(Arc::new(
                BeaconClient::new(&endpoint.url, timeout)?,
            ))),
        }
    }

    pub fn kind(&self) -> EndpointKind {
        match self {
            NodeClient::Execution(_) => EndpointKind::Execution,
            NodeClient::Consensus(_) => EndpointKind::Consensus,
        }
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeClient").field(&self.kind()).finish()
    }
}
