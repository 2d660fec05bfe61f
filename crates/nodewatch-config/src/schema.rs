//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Peers above `min_peers` a node must reach once before low peer counts alert.
pub const PEER_STARTUP_MARGIN: u64 = 2;

/// Accepted `verbosity` values.
pub const VERBOSITY_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// Global PagerDuty settings, used when an endpoint has none of its own.
    #[serde(default)]
    pub pagerduty: Option<PagerDutyConfig>,

    /// Global Slack settings, used when an endpoint has none of its own.
    #[serde(default)]
    pub slack: Option<SlackConfig>,

    #[serde(default = "default_verbosity")]
    pub verbosity: String,

    /// Timeout applied to every request made against a node.
    #[serde(default = "default_rpc_timeout", with = "humantime_serde")]
    pub rpc_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            pagerduty: None,
            slack: None,
            verbosity: default_verbosity(),
            rpc_timeout: default_rpc_timeout(),
        }
    }
}

fn default_verbosity() -> String {
    "info".to_string()
}

fn default_rpc_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Which client layer an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// JSON-RPC execution client (geth, reth, nethermind, ...).
    Execution,
    /// Beacon API consensus client (lighthouse, prysm, teku, ...).
    Consensus,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Execution => write!(f, "execution"),
            EndpointKind::Consensus => write!(f, "consensus"),
        }
    }
}

/// A monitored node and its alerting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,

    pub url: String,

    #[serde(rename = "type", alias = "kind")]
    pub kind: EndpointKind,

    /// Longest tolerated time without block progress.
    #[serde(default = "default_new_block_max_duration", with = "humantime_serde")]
    pub new_block_max_duration: Duration,

    /// Minimum healthy peer count. Zero disables peer monitoring.
    #[serde(default)]
    pub min_peers: u64,

    #[serde(default = "default_poll_duration", with = "humantime_serde")]
    pub poll_duration: Duration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagerduty: Option<PagerDutyConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,
}

impl EndpointConfig {
    /// Create an endpoint with default thresholds and no channel overrides.
    pub fn new(name: impl Into<String>, url: impl Into<String>, kind: EndpointKind) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            kind,
            new_block_max_duration: default_new_block_max_duration(),
            min_peers: 0,
            poll_duration: default_poll_duration(),
            pagerduty: None,
            slack: None,
        }
    }

    /// Whether a peer count monitor should run for this endpoint.
    pub fn monitors_peers(&self) -> bool {
        self.min_peers > 0
    }
}

fn default_new_block_max_duration() -> Duration {
    Duration::from_secs(60)
}

fn default_poll_duration() -> Duration {
    Duration::from_secs(10)
}

/// PagerDuty Events v2 settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerDutyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub routing_key: String,

    /// Reported as the event source. Falls back to the endpoint name.
    #[serde(default)]
    pub service: String,
}

impl PagerDutyConfig {
    /// A routing key is all PagerDuty needs to accept an event.
    pub fn is_complete(&self) -> bool {
        !self.routing_key.is_empty()
    }

    /// Enabled and complete: alerts can go out through this block.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.is_complete()
    }
}

/// Slack settings: either an incoming webhook, or a bot token plus channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub webhook_url: String,

    #[serde(default)]
    pub channel: String,

    #[serde(default)]
    pub token: String,
}

impl SlackConfig {
    pub fn has_webhook(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    pub fn has_api_credentials(&self) -> bool {
        !self.channel.is_empty() && !self.token.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.has_webhook() || self.has_api_credentials()
    }

    pub fn is_usable(&self) -> bool {
        self.enabled && self.is_complete()
    }
}
