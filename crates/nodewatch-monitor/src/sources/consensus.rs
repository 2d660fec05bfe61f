//! Consensus client over the beacon node REST API.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, header};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::MonitorError;

use super::sse::SseDecoder;
use super::{BlockHandler, BlockSubscription, PeerSource};

#[derive(Debug, Deserialize)]
struct PeerCountResponse {
    data: PeerCountData,
}

#[derive(Debug, Deserialize)]
struct PeerCountData {
    connected: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct BlockEvent {
    slot: serde_json::Value,
}

/// Beacon API numbers are decimal strings; some clients send plain numbers.
fn decimal(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        other => other.as_u64(),
    }
}

/// Beacon node client: peer count polling and the block event stream.
pub struct BeaconClient {
    base: Url,
    client: Client,
    /// No overall timeout: the event stream is long-lived.
    stream_client: Client,
}

impl BeaconClient {
    /// Create a client. `timeout` bounds polled requests and the event stream's connect.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, MonitorError> {
        let base = Url::parse(url)
            .map_err(|e| MonitorError::Client(format!("invalid URL {}: {}", url, e)))?;
        if base.cannot_be_a_base() {
            return Err(MonitorError::Client(format!("{} cannot be a base URL", url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Client(e.to_string()))?;
        let stream_client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Client(e.to_string()))?;

        Ok(Self {
            base,
            client,
            stream_client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, MonitorError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| MonitorError::Client(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn handle_event(data: &str, on_block: &BlockHandler) {
        match serde_json::from_str::<BlockEvent>(data) {
            Ok(event) => match decimal(&event.slot) {
                Some(slot) => {
                    debug!(slot, "block event");
                    on_block(slot);
                }
                None => warn!(slot = %event.slot, "block event with invalid slot"),
            },
            Err(e) => warn!(error = %e, "malformed block event"),
        }
    }
}

#[async_trait]
impl PeerSource for BeaconClient {
    async fn peer_count(&self) -> Result<u64, MonitorError> {
        let url = self.endpoint(&["eth", "v1", "node", "peer_count"])?;

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| MonitorError::Rpc(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Rpc(format!("HTTP {}: {}", status, body)));
        }

        let body: PeerCountResponse = response
            .json()
            .await
            .map_err(|e| MonitorError::InvalidResponse(e.to_string()))?;

        decimal(&body.data.connected).ok_or_else(|| {
            MonitorError::InvalidResponse(format!("invalid peer count {}", body.data.connected))
        })
    }
}

#[async_trait]
impl BlockSubscription for BeaconClient {
    async fn subscribe_blocks(
        &self,
        cancel: CancellationToken,
        on_block: BlockHandler,
    ) -> Result<(), MonitorError> {
        let mut url = self.endpoint(&["eth", "v1", "events"])?;
        url.set_query(Some("topics=block"));

        let request = self
            .stream_client
            .get(url)
            .header(header::ACCEPT, "text/event-stream")
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            result = request => result.map_err(|e| MonitorError::Subscription(e.to_string()))?,
        };

        if !response.status().is_success() {
            return Err(MonitorError::Subscription(format!(
                "event stream returned HTTP {}",
                response.status()
            )));
        }

        debug!("block event stream established");
        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for event in decoder.feed(&bytes) {
                            if event.event == "block" {
                                Self::handle_event(&event.data, &on_block);
                            }
                        }
                    }
                    Some(Err(e)) => return Err(MonitorError::Subscription(e.to_string())),
                    None => {
                        return Err(MonitorError::Subscription(
                            "event stream closed by server".to_string(),
                        ));
                    }
                },
            }
        }
    }
}
