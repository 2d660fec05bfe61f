//! Alert channel implementations (Slack, PagerDuty).

#[cfg(test)]
#[path = "alert_channels_tests.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::MonitorError;

use super::alerts::{Alert, AlertChannel};

const SLACK_API_BASE: &str = "https://slack.com/api";
const PAGERDUTY_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";
const ALERT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a Slack message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackTarget {
    /// Incoming webhook URL.
    Webhook { url: String },
    /// Bot token posting to a channel through `chat.postMessage`.
    Api { token: String, channel: String },
}

/// Slack channel.
pub struct SlackChannel {
    target: SlackTarget,
    api_base: String,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a new Slack channel.
    pub fn new(target: SlackTarget) -> Self {
        Self {
            target,
            api_base: SLACK_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the Web API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn attachment(alert: &Alert) -> serde_json::Value {
        let fields = alert
            .metadata
            .iter()
            .map(|(k, v)| {
                serde_json::json!({
                    "title": k,
                    "value": v,
                    "short": true
                })
            })
            .collect::<Vec<_>>();

        serde_json::json!({
            "color": alert.severity.color(),
            "fields": fields,
            "ts": alert.timestamp.timestamp(),
        })
    }

    async fn post_webhook(&self, url: &str, alert: &Alert) -> Result<(), MonitorError> {
        let payload = serde_json::json!({
            "text": alert.format_text(),
            "attachments": [Self::attachment(alert)],
        });

        let response = self
            .client
            .post(url)
            .timeout(ALERT_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::Alert(format!("Slack request failed: {}", e)))?;

        if response.status().is_success() {
            debug!("Slack alert sent via webhook");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(MonitorError::Alert(format!(
                "Slack webhook returned {}: {}",
                status, body
            )))
        }
    }

    async fn post_message(
        &self,
        token: &str,
        channel: &str,
        alert: &Alert,
    ) -> Result<(), MonitorError> {
        #[derive(Deserialize)]
        struct PostMessageResponse {
            ok: bool,
            #[serde(default)]
            error: Option<String>,
        }

        let payload = serde_json::json!({
            "channel": channel,
            "text": alert.format_text(),
            "attachments": [Self::attachment(alert)],
        });

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base.trim_end_matches('/')))
            .timeout(ALERT_TIMEOUT)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::Alert(format!("Slack request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::Alert(format!("Slack API returned {}", status)));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| MonitorError::Alert(format!("Invalid Slack API response: {}", e)))?;

        if body.ok {
            debug!(channel, "Slack alert sent via chat.postMessage");
            Ok(())
        } else {
            Err(MonitorError::Alert(format!(
                "Slack API rejected message: {}",
                body.error.unwrap_or_else(|| "unknown error".to_string())
            )))
        }
    }
}

#[async_trait]
impl AlertChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    async fn raise(&self, alert: &Alert) -> Result<(), MonitorError> {
        match &self.target {
            SlackTarget::Webhook { url } => self.post_webhook(url, alert).await,
            SlackTarget::Api { token, channel } => self.post_message(token, channel, alert).await,
        }
    }
}

/// PagerDuty Events API v2 channel.
pub struct PagerDutyChannel {
    routing_key: String,
    service: String,
    events_url: String,
    client: reqwest::Client,
}

impl PagerDutyChannel {
    /// Create a new PagerDuty channel. `service` is reported as the event source.
    pub fn new(routing_key: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            routing_key: routing_key.into(),
            service: service.into(),
            events_url: PAGERDUTY_EVENTS_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the events endpoint.
    pub fn with_events_url(mut self, events_url: impl Into<String>) -> Self {
        self.events_url = events_url.into();
        self
    }

    fn event(&self, alert: &Alert) -> serde_json::Value {
        let source = if self.service.is_empty() {
            alert.source.as_str()
        } else {
            self.service.as_str()
        };

        serde_json::json!({
            "routing_key": self.routing_key,
            "event_action": "trigger",
            "payload": {
                "summary": alert.message,
                "severity": alert.severity.as_str(),
                "source": source,
                "component": alert.source,
                "timestamp": alert.timestamp.to_rfc3339(),
                "custom_details": alert.metadata,
            }
        })
    }
}

#[async_trait]
impl AlertChannel for PagerDutyChannel {
    fn name(&self) -> &str {
        "pagerduty"
    }

    async fn raise(&self, alert: &Alert) -> Result<(), MonitorError> {
        let response = self
            .client
            .post(&self.events_url)
            .timeout(ALERT_TIMEOUT)
            .json(&self.event(alert))
            .send()
            .await
            .map_err(|e| MonitorError::Alert(format!("PagerDuty request failed: {}", e)))?;

        if response.status().is_success() {
            debug!("PagerDuty event accepted");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(MonitorError::Alert(format!(
                "PagerDuty returned {}: {}",
                status, body
            )))
        }
    }
}
