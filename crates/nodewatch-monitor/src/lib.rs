//! # nodewatch monitor
//!
//! Health evaluation and alerting for blockchain node endpoints.
//!
//! ## Features
//!
//! - Block progress and peer count evaluators
//! - Poll loops with cooperative cancellation
//! - Execution (JSON-RPC) and consensus (beacon API) sources
//! - Alert fan-out to Slack and PagerDuty with endpoint/global fallback

pub mod alert_channels;
pub mod alert_router;
pub mod alerts;
pub mod checks;
pub mod error;
pub mod evaluator;
pub mod monitor;
pub mod resolver;
pub mod sources;

pub use alert_channels::{PagerDutyChannel, SlackChannel, SlackTarget};
pub use alert_router::{AlertReport, AlertRouter};
pub use alerts::{Alert, AlertChannel, AlertSeverity};
pub use checks::{BlockNumberCheck, HealthCheck, PeerCountCheck, SlotEventCheck};
pub use error::MonitorError;
pub use evaluator::{PeerTracker, ProgressTracker, Verdict};
pub use monitor::Monitor;
pub use resolver::{ChannelBinding, ChannelSettings, fallback, resolve_channels};
pub use sources::{
    BeaconClient, BlockHandler, BlockSource, BlockSubscription, ConsensusApi, ExecutionApi,
    ExecutionClient, NodeClient, PeerSource,
};
