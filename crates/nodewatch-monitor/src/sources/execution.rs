//! Execution client over JSON-RPC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use url::Url;

use crate::error::MonitorError;

use super::{BlockSource, PeerSource};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client for `eth_blockNumber` and `net_peerCount`.
pub struct ExecutionClient {
    client: Client,
    url: Url,
    next_id: AtomicU64,
}

impl ExecutionClient {
    /// Create a client. Every request is bounded by `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, MonitorError> {
        let url = Url::parse(url)
            .map_err(|e| MonitorError::Client(format!("invalid URL {}: {}", url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str) -> Result<serde_json::Value, MonitorError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": [],
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let response = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| MonitorError::Rpc(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Rpc(format!("HTTP {}: {}", status, body)));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| MonitorError::InvalidResponse(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(MonitorError::Rpc(format!(
                "{} returned error {}: {}",
                method, err.code, err.message
            )));
        }

        body.result
            .ok_or_else(|| MonitorError::InvalidResponse(format!("{} returned no result", method)))
    }

    async fn call_quantity(&self, method: &str) -> Result<u64, MonitorError> {
        let value = self.call(method).await?;
        let text = value.as_str().ok_or_else(|| {
            MonitorError::InvalidResponse(format!("{} returned non-string {}", method, value))
        })?;
        parse_quantity(text)
    }
}

/// Parse a hex-encoded JSON-RPC quantity such as `0x1b4`.
fn parse_quantity(text: &str) -> Result<u64, MonitorError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| MonitorError::InvalidResponse(format!("not a hex quantity: {}", text)))?;

    u64::from_str_radix(digits, 16)
        .map_err(|e| MonitorError::InvalidResponse(format!("bad quantity {}: {}", text, e)))
}

#[async_trait]
impl BlockSource for ExecutionClient {
    async fn latest_height(&self) -> Result<u64, MonitorError> {
        self.call_quantity("eth_blockNumber").await
    }
}

#[async_trait]
impl PeerSource for ExecutionClient {
    async fn peer_count(&self) -> Result<u64, MonitorError> {
        self.call_quantity("net_peerCount").await
    }
}
