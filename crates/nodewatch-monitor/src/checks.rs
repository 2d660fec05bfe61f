//! Health checks: one signal of one endpoint, sampled once per poll cycle.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::MonitorError;
use crate::evaluator::{PeerTracker, ProgressTracker, Verdict};
use crate::sources::{BlockHandler, BlockSource, BlockSubscription, PeerSource};

/// Background work a check keeps running between cycles.
pub type BackgroundTask = JoinHandle<Result<(), MonitorError>>;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Metric name and last observed value, once something was observed.
    fn observed(&self) -> Option<(&'static str, u64)>;

    /// Sample the signal and judge it. Fetch failures are unhealthy verdicts.
    async fn check(&mut self) -> Verdict;

    /// Start background work. Called once before the first cycle.
    fn start(&mut self, _cancel: &CancellationToken) -> Option<BackgroundTask> {
        None
    }
}

/// Polls the latest block height.
pub struct BlockNumberCheck<S: ?Sized> {
    source: Arc<S>,
    tracker: ProgressTracker,
}

impl<S: BlockSource + ?Sized> BlockNumberCheck<S> {
    pub fn new(source: Arc<S>, max_gap: std::time::Duration) -> Self {
        Self {
            source,
            tracker: ProgressTracker::new(max_gap),
        }
    }
}

#[async_trait]
impl<S: BlockSource + ?Sized + 'static> HealthCheck for BlockNumberCheck<S> {
    fn observed(&self) -> Option<(&'static str, u64)> {
        self.tracker.observed_height().map(|height| ("block", height))
    }

    async fn check(&mut self) -> Verdict {
        match self.source.latest_height().await {
            Ok(height) => self.tracker.evaluate(height, Instant::now()),
            Err(e) => Verdict::Unhealthy(format!("failed to get block number: {}", e)),
        }
    }
}

/// Polls the connected peer count.
pub struct PeerCountCheck<S: ?Sized> {
    source: Arc<S>,
    tracker: PeerTracker,
    sampled: bool,
}

impl<S: PeerSource + ?Sized> PeerCountCheck<S> {
    pub fn new(source: Arc<S>, min_peers: u64) -> Self {
        Self {
            source,
            tracker: PeerTracker::new(min_peers),
            sampled: false,
        }
    }
}

#[async_trait]
impl<S: PeerSource + ?Sized + 'static> HealthCheck for PeerCountCheck<S> {
    fn observed(&self) -> Option<(&'static str, u64)> {
        self.sampled.then(|| ("peers", self.tracker.last_peer_count()))
    }

    async fn check(&mut self) -> Verdict {
        match self.source.peer_count().await {
            Ok(count) => {
                self.sampled = true;
                self.tracker.evaluate(count)
            }
            Err(e) => Verdict::Unhealthy(format!("failed to get peer count: {}", e)),
        }
    }
}

/// Follows pushed slot events and checks them for staleness each cycle.
pub struct SlotEventCheck<S: ?Sized> {
    source: Arc<S>,
    tracker: Arc<Mutex<ProgressTracker>>,
}

impl<S: BlockSubscription + ?Sized> SlotEventCheck<S> {
    pub fn new(source: Arc<S>, max_gap: std::time::Duration) -> Self {
        Self {
            source,
            tracker: Arc::new(Mutex::new(ProgressTracker::new(max_gap))),
        }
    }
}

#[async_trait]
impl<S: BlockSubscription + ?Sized + 'static> HealthCheck for SlotEventCheck<S> {
    fn observed(&self) -> Option<(&'static str, u64)> {
        self.tracker.lock().observed_height().map(|slot| ("slot", slot))
    }

    async fn check(&mut self) -> Verdict {
        self.tracker.lock().check_stale(Instant::now())
    }

    fn start(&mut self, cancel: &CancellationToken) -> Option<BackgroundTask> {
        let tracker = self.tracker.clone();
        let on_block: BlockHandler =
            Arc::new(move |slot: u64| tracker.lock().record(slot, Instant::now()));

        let source = self.source.clone();
        let cancel = cancel.clone();
        Some(tokio::spawn(
            async move { source.subscribe_blocks(cancel, on_block).await }.in_current_span(),
        ))
    }
}
