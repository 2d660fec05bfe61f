//! Health evaluation state machines.
//!
//! Evaluators are synchronous and take the current time as an argument, so the
//! poll loop owns the clock and tests can drive them with fixed instants.

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;

use std::time::Duration;

use nodewatch_config::PEER_STARTUP_MARGIN;
use tokio::time::Instant;

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    Unhealthy(String),
}

impl Verdict {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Verdict::Healthy)
    }

    /// Failure message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Verdict::Healthy => None,
            Verdict::Unhealthy(msg) => Some(msg),
        }
    }
}

/// Tracks block (or slot) progress against a maximum tolerated gap.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    max_gap: Duration,
    last_height: u64,
    last_progress: Option<Instant>,
    sampled: bool,
    pending_regression: Option<String>,
}

impl ProgressTracker {
    pub fn new(max_gap: Duration) -> Self {
        Self {
            max_gap,
            last_height: 0,
            last_progress: None,
            sampled: false,
            pending_regression: None,
        }
    }

    pub fn last_height(&self) -> u64 {
        self.last_height
    }

    pub fn last_progress(&self) -> Option<Instant> {
        self.last_progress
    }

    /// Last height actually reported by the node, if any.
    pub fn observed_height(&self) -> Option<u64> {
        self.sampled.then_some(self.last_height)
    }

    /// Evaluate a polled height.
    pub fn evaluate(&mut self, height: u64, now: Instant) -> Verdict {
        let Some(last_progress) = self.last_progress else {
            self.advance(height, now);
            return Verdict::Healthy;
        };

        if height < self.last_height {
            let verdict = Verdict::Unhealthy(regression_message(self.last_height, height));
            self.advance(height, now);
            return verdict;
        }

        if height > self.last_height {
            self.advance(height, now);
            return Verdict::Healthy;
        }

        self.staleness(last_progress, now)
    }

    /// Record a pushed block event. Every event counts as a sign of life, a
    /// lower height is kept as a pending regression for the next check.
    pub fn record(&mut self, height: u64, now: Instant) {
        if self.last_progress.is_some() && height < self.last_height {
            self.pending_regression = Some(regression_message(self.last_height, height));
        }
        self.advance(height, now);
    }

    /// Check the pushed state for staleness.
    pub fn check_stale(&mut self, now: Instant) -> Verdict {
        if let Some(msg) = self.pending_regression.take() {
            return Verdict::Unhealthy(msg);
        }

        match self.last_progress {
            Some(last_progress) => self.staleness(last_progress, now),
            None => {
                // Nothing received yet: the clock starts at the first check.
                self.last_progress = Some(now);
                Verdict::Healthy
            }
        }
    }

    fn advance(&mut self, height: u64, now: Instant) {
        self.last_height = height;
        self.last_progress = Some(now);
        self.sampled = true;
    }

    fn staleness(&self, last_progress: Instant, now: Instant) -> Verdict {
        let elapsed = now.saturating_duration_since(last_progress);
        if elapsed > self.max_gap {
            Verdict::Unhealthy(format!(
                "no new block for {:.1}s, expected less than {:.1}s",
                elapsed.as_secs_f64(),
                self.max_gap.as_secs_f64()
            ))
        } else {
            Verdict::Healthy
        }
    }
}

fn regression_message(last: u64, height: u64) -> String {
    format!("block height decreased from {} to {}", last, height)
}

/// Tracks peer count against a minimum, silent until the node has first
/// climbed clearly above it.
#[derive(Debug, Clone)]
pub struct PeerTracker {
    min_peers: u64,
    last_peer_count: u64,
    cleared_startup: bool,
}

impl PeerTracker {
    pub fn new(min_peers: u64) -> Self {
        Self {
            min_peers,
            last_peer_count: 0,
            cleared_startup: false,
        }
    }

    pub fn last_peer_count(&self) -> u64 {
        self.last_peer_count
    }

    pub fn cleared_startup(&self) -> bool {
        self.cleared_startup
    }

    pub fn evaluate(&mut self, count: u64) -> Verdict {
        self.last_peer_count = count;

        if self.min_peers > 0 && count < self.min_peers && self.cleared_startup {
            return Verdict::Unhealthy(format!(
                "peer count {} below minimum {}",
                count, self.min_peers
            ));
        }

        if count > self.min_peers.saturating_add(PEER_STARTUP_MARGIN) {
            self.cleared_startup = true;
        }

        Verdict::Healthy
    }
}
