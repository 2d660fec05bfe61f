//! Tests for the Slack and PagerDuty channels.

use super::*;
use crate::alerts::AlertSeverity;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stalled_alert() -> Alert {
    Alert::new(
        "geth-mainnet",
        "no new block for 90.0s, expected less than 60.0s",
        AlertSeverity::Error,
    )
    .with_metadata("block", "19000000")
}

#[test]
fn test_channel_names() {
    let slack = SlackChannel::new(SlackTarget::Webhook {
        url: "https://hooks.slack.com/test".to_string(),
    });
    assert_eq!(slack.name(), "slack");

    let pd = PagerDutyChannel::new("key", "fleet");
    assert_eq!(pd.name(), "pagerduty");
}

#[test]
fn test_pagerduty_event_source_falls_back_to_endpoint() {
    let pd = PagerDutyChannel::new("key", "");
    let event = pd.event(&stalled_alert());
    assert_eq!(event["payload"]["source"], "geth-mainnet");
    assert_eq!(event["payload"]["severity"], "error");
    assert_eq!(event["payload"]["custom_details"]["block"], "19000000");

    let pd = PagerDutyChannel::new("key", "node-fleet");
    assert_eq!(pd.event(&stalled_alert())["payload"]["source"], "node-fleet");
}

#[tokio::test]
async fn test_slack_webhook_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/hook"))
        .and(body_partial_json(serde_json::json!({
            "text": "[ERROR] geth-mainnet: no new block for 90.0s, expected less than 60.0s"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let channel = SlackChannel::new(SlackTarget::Webhook {
        url: format!("{}/services/hook", server.uri()),
    });

    channel.raise(&stalled_alert()).await.unwrap();
}

#[tokio::test]
async fn test_slack_webhook_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no_service"))
        .mount(&server)
        .await;

    let channel = SlackChannel::new(SlackTarget::Webhook { url: server.uri() });

    let err = channel.raise(&stalled_alert()).await.unwrap_err();
    assert!(err.to_string().contains("no_service"));
}

#[tokio::test]
async fn test_slack_api_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-token"))
        .and(body_partial_json(serde_json::json!({ "channel": "#nodes" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = SlackChannel::new(SlackTarget::Api {
        token: "xoxb-token".to_string(),
        channel: "#nodes".to_string(),
    })
    .with_api_base(server.uri());

    channel.raise(&stalled_alert()).await.unwrap();
}

#[tokio::test]
async fn test_slack_api_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": false,
            "error": "channel_not_found"
        })))
        .mount(&server)
        .await;

    let channel = SlackChannel::new(SlackTarget::Api {
        token: "xoxb-token".to_string(),
        channel: "#missing".to_string(),
    })
    .with_api_base(server.uri());

    let err = channel.raise(&stalled_alert()).await.unwrap_err();
    assert!(err.to_string().contains("channel_not_found"));
}

#[tokio::test]
async fn test_pagerduty_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/enqueue"))
        .and(body_partial_json(serde_json::json!({
            "routing_key": "rk",
            "event_action": "trigger",
            "payload": { "component": "geth-mainnet", "severity": "error" }
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let channel = PagerDutyChannel::new("rk", "fleet")
        .with_events_url(format!("{}/v2/enqueue", server.uri()));

    channel.raise(&stalled_alert()).await.unwrap();
}

#[tokio::test]
async fn test_pagerduty_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid routing key"))
        .mount(&server)
        .await;

    let channel = PagerDutyChannel::new("bad", "").with_events_url(server.uri());

    let err = channel.raise(&stalled_alert()).await.unwrap_err();
    assert!(err.to_string().contains("400"));
}
