//! Alert channel resolution.
//!
//! Each delivery mechanism is resolved independently: the endpoint's own block
//! is used when it is enabled and complete, otherwise the global block under
//! the same conditions, otherwise the mechanism is skipped.

use std::sync::Arc;

use nodewatch_config::{Config, EndpointConfig, PagerDutyConfig, SlackConfig};

use crate::alert_channels::{PagerDutyChannel, SlackChannel, SlackTarget};
use crate::alerts::AlertChannel;

/// Common view over the per-mechanism settings blocks.
pub trait ChannelSettings {
    /// Enabled and carrying everything the mechanism needs.
    fn is_usable(&self) -> bool;
}

impl ChannelSettings for PagerDutyConfig {
    fn is_usable(&self) -> bool {
        PagerDutyConfig::is_usable(self)
    }
}

impl ChannelSettings for SlackConfig {
    fn is_usable(&self) -> bool {
        SlackConfig::is_usable(self)
    }
}

/// Pick the endpoint block if usable, else the global one if usable.
pub fn fallback<'a, T: ChannelSettings>(
    endpoint: Option<&'a T>,
    global: Option<&'a T>,
) -> Option<&'a T> {
    endpoint
        .filter(|s| s.is_usable())
        .or_else(|| global.filter(|s| s.is_usable()))
}

/// A resolved, ready-to-build alert channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelBinding {
    PagerDuty { routing_key: String, service: String },
    Slack(SlackTarget),
}

impl ChannelBinding {
    fn pagerduty(settings: &PagerDutyConfig) -> Self {
        ChannelBinding::PagerDuty {
            routing_key: settings.routing_key.clone(),
            service: settings.service.clone(),
        }
    }

    fn slack(settings: &SlackConfig) -> Self {
        // A webhook wins when one block carries both forms.
        if settings.has_webhook() {
            ChannelBinding::Slack(SlackTarget::Webhook {
                url: settings.webhook_url.clone(),
            })
        } else {
            ChannelBinding::Slack(SlackTarget::Api {
                token: settings.token.clone(),
                channel: settings.channel.clone(),
            })
        }
    }

    /// Construct the channel this binding describes.
    pub fn build(&self) -> Arc<dyn AlertChannel> {
        match self {
            ChannelBinding::PagerDuty {
                routing_key,
                service,
            } => Arc::new(PagerDutyChannel::new(routing_key.clone(), service.clone())),
            ChannelBinding::Slack(target) => Arc::new(SlackChannel::new(target.clone())),
        }
    }

    /// Short description without credentials, for startup output.
    pub fn describe(&self) -> String {
        match self {
            ChannelBinding::PagerDuty { service, .. } if !service.is_empty() => {
                format!("pagerduty (service {})", service)
            }
            ChannelBinding::PagerDuty { .. } => "pagerduty".to_string(),
            ChannelBinding::Slack(SlackTarget::Webhook { .. }) => "slack (webhook)".to_string(),
            ChannelBinding::Slack(SlackTarget::Api { channel, .. }) => {
                format!("slack ({})", channel)
            }
        }
    }
}

/// Resolve the channels an endpoint alerts through, PagerDuty first.
pub fn resolve_channels(endpoint: &EndpointConfig, config: &Config) -> Vec<ChannelBinding> {
    let mut bindings = Vec::new();

    if let Some(pd) = fallback(endpoint.pagerduty.as_ref(), config.pagerduty.as_ref()) {
        bindings.push(ChannelBinding::pagerduty(pd));
    }
    if let Some(slack) = fallback(endpoint.slack.as_ref(), config.slack.as_ref()) {
        bindings.push(ChannelBinding::slack(slack));
    }

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodewatch_config::EndpointKind;

    fn webhook(url: &str) -> SlackConfig {
        SlackConfig {
            enabled: true,
            webhook_url: url.to_string(),
            ..Default::default()
        }
    }

    fn pagerduty(key: &str) -> PagerDutyConfig {
        PagerDutyConfig {
            enabled: true,
            routing_key: key.to_string(),
            service: String::new(),
        }
    }

    fn endpoint() -> EndpointConfig {
        EndpointConfig::new("geth", "http://localhost:8545", EndpointKind::Execution)
    }

    #[test]
    fn test_endpoint_webhook_beats_global() {
        let mut ep = endpoint();
        ep.slack = Some(webhook("https://hooks.slack.com/endpoint"));
        let config = Config {
            slack: Some(webhook("https://hooks.slack.com/global")),
            ..Default::default()
        };

        let bindings = resolve_channels(&ep, &config);
        assert_eq!(
            bindings,
            vec![ChannelBinding::Slack(SlackTarget::Webhook {
                url: "https://hooks.slack.com/endpoint".to_string()
            })]
        );
    }

    #[test]
    fn test_disabled_endpoint_block_falls_back() {
        let mut ep = endpoint();
        ep.slack = Some(SlackConfig {
            enabled: false,
            ..webhook("https://hooks.slack.com/endpoint")
        });
        let config = Config {
            slack: Some(webhook("https://hooks.slack.com/global")),
            ..Default::default()
        };

        let bindings = resolve_channels(&ep, &config);
        assert_eq!(
            bindings,
            vec![ChannelBinding::Slack(SlackTarget::Webhook {
                url: "https://hooks.slack.com/global".to_string()
            })]
        );
    }

    #[test]
    fn test_incomplete_endpoint_block_falls_back() {
        let mut ep = endpoint();
        ep.slack = Some(SlackConfig {
            enabled: true,
            channel: "#nodes".to_string(),
            ..Default::default()
        });
        let config = Config {
            slack: Some(webhook("https://hooks.slack.com/global")),
            ..Default::default()
        };

        let bindings = resolve_channels(&ep, &config);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].describe(), "slack (webhook)");
    }

    #[test]
    fn test_nothing_configured() {
        let bindings = resolve_channels(&endpoint(), &Config::default());
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_disabled_global_is_skipped() {
        let config = Config {
            pagerduty: Some(PagerDutyConfig {
                enabled: false,
                ..pagerduty("rk")
            }),
            ..Default::default()
        };
        assert!(resolve_channels(&endpoint(), &config).is_empty());
    }

    #[test]
    fn test_pagerduty_before_slack() {
        let mut ep = endpoint();
        ep.pagerduty = Some(pagerduty("endpoint-key"));
        let config = Config {
            pagerduty: Some(pagerduty("global-key")),
            slack: Some(SlackConfig {
                enabled: true,
                channel: "#nodes".to_string(),
                token: "xoxb".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let bindings = resolve_channels(&ep, &config);
        assert_eq!(
            bindings,
            vec![
                ChannelBinding::PagerDuty {
                    routing_key: "endpoint-key".to_string(),
                    service: String::new(),
                },
                ChannelBinding::Slack(SlackTarget::Api {
                    token: "xoxb".to_string(),
                    channel: "#nodes".to_string(),
                }),
            ]
        );
    }

    #[test]
    fn test_webhook_wins_within_block() {
        let slack = SlackConfig {
            enabled: true,
            webhook_url: "https://hooks.slack.com/x".to_string(),
            channel: "#nodes".to_string(),
            token: "xoxb".to_string(),
        };
        assert!(matches!(
            ChannelBinding::slack(&slack),
            ChannelBinding::Slack(SlackTarget::Webhook { .. })
        ));
    }

    #[test]
    fn test_fallback_generic() {
        let usable = pagerduty("a");
        let unusable = PagerDutyConfig::default();
        assert_eq!(fallback(Some(&unusable), Some(&usable)), Some(&usable));
        assert_eq!(fallback(Some(&usable), None), Some(&usable));
        assert_eq!(fallback::<PagerDutyConfig>(None, None), None);
        assert_eq!(fallback(None, Some(&unusable)), None);
    }

    #[test]
    fn test_describe_hides_secrets() {
        let binding = ChannelBinding::PagerDuty {
            routing_key: "secret".to_string(),
            service: "fleet".to_string(),
        };
        assert_eq!(binding.describe(), "pagerduty (service fleet)");
        assert_eq!(binding.build().name(), "pagerduty");
    }
}
