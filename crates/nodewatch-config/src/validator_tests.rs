
    use super::*;
    use crate::schema::EndpointKind;
    use std::time::Duration;

    fn config_with(endpoint: EndpointConfig) -> Config {
        Config {
            endpoints: vec![endpoint],
            slack: Some(SlackConfig {
                enabled: true,
                webhook_url: "https://hooks.slack.com/services/x".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn execution(name: &str) -> EndpointConfig {
        EndpointConfig::new(name, "http://localhost:8545", EndpointKind::Execution)
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "endpoints"));
    }

    #[test]
    fn test_validate_good_endpoint() {
        let config = config_with(execution("geth"));
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_validate_empty_name() {
        let config = config_with(execution(""));
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "endpoints[0].name"));
    }

    #[test]
    fn test_validate_duplicate_name() {
        let mut config = config_with(execution("geth"));
        config.endpoints.push(execution("geth"));

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "endpoints[1].name"));
    }

    #[test]
    fn test_validate_empty_url() {
        let mut endpoint = execution("geth");
        endpoint.url = String::new();

        let result = ConfigValidator::validate(&config_with(endpoint)).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "endpoints[0].url"));
    }

    #[test]
    fn test_validate_invalid_url() {
        let mut endpoint = execution("geth");
        endpoint.url = "not a url".to_string();

        let result = ConfigValidator::validate(&config_with(endpoint)).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_zero_durations() {
        let mut endpoint = execution("geth");
        endpoint.poll_duration = Duration::ZERO;
        endpoint.new_block_max_duration = Duration::ZERO;

        let result = ConfigValidator::validate(&config_with(endpoint)).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "endpoints[0].poll_duration"));
        assert!(result
            .errors
            .iter()
            .any(|e| e.path == "endpoints[0].new_block_max_duration"));
    }

    #[test]
    fn test_validate_slow_poll_warning() {
        let mut endpoint = execution("geth");
        endpoint.poll_duration = Duration::from_secs(120);

        let result = ConfigValidator::validate(&config_with(endpoint)).unwrap();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.path == "endpoints[0].poll_duration"));
    }

    #[test]
    fn test_validate_unknown_verbosity_warning() {
        let mut config = config_with(execution("geth"));
        config.verbosity = "loud".to_string();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "verbosity"));
    }

    #[test]
    fn test_validate_zero_rpc_timeout() {
        let mut config = config_with(execution("geth"));
        config.rpc_timeout = Duration::ZERO;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "rpc_timeout"));
    }

    #[test]
    fn test_validate_no_channels_warning() {
        let config = Config {
            endpoints: vec![execution("geth")],
            ..Default::default()
        };

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "endpoints[0]"));
    }

    #[test]
    fn test_validate_disabled_channels_count_as_none() {
        let mut config = config_with(execution("geth"));
        if let Some(slack) = config.slack.as_mut() {
            slack.enabled = false;
        }
        config.pagerduty = Some(PagerDutyConfig {
            enabled: false,
            routing_key: "R0UT1NG".to_string(),
            ..Default::default()
        });

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "endpoints[0]"));
    }

    #[test]
    fn test_validate_incomplete_endpoint_slack_warning() {
        let mut endpoint = execution("geth");
        endpoint.slack = Some(SlackConfig {
            enabled: true,
            channel: "#alerts".to_string(),
            ..Default::default()
        });

        let result = ConfigValidator::validate(&config_with(endpoint)).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "endpoints[0].slack"));
    }

    #[test]
    fn test_validate_incomplete_pagerduty_warning() {
        let mut config = config_with(execution("geth"));
        config.pagerduty = Some(PagerDutyConfig {
            enabled: true,
            ..Default::default()
        });

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.warnings.iter().any(|w| w.path == "pagerduty.routing_key"));
    }

    #[test]
    fn test_into_result_joins_errors() {
        let mut endpoint = execution("");
        endpoint.url = String::new();

        let result = ConfigValidator::validate(&config_with(endpoint)).unwrap();
        let err = result.into_result().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("endpoints[0].name"));
        assert!(message.contains("endpoints[0].url"));
    }

    #[test]
    fn test_into_result_returns_warnings() {
        let warnings = ConfigValidator::validate(&Config::default())
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(warnings.len(), 1);
    }
