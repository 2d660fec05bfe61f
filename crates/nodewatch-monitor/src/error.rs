//! Monitor errors.

use thiserror::Error;

/// Monitor error types.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Alert channel error.
    #[error("Alert error: {0}")]
    Alert(String),

    /// A request against a node failed.
    #[error("RPC request failed: {0}")]
    Rpc(String),

    /// The node answered with something we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The block event subscription failed or ended.
    #[error("Block subscription failed: {0}")]
    Subscription(String),

    /// A node client could not be constructed.
    #[error("Failed to create client: {0}")]
    Client(String),
}
