//! Configuration validation.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::schema::{Config, EndpointConfig, PagerDutyConfig, SlackConfig, VERBOSITY_LEVELS};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn collected errors into a single `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        if self.is_valid() {
            return Ok(self.warnings);
        }
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::Invalid(joined))
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_globals(config, &mut result);

        let mut seen = HashSet::new();
        for (idx, endpoint) in config.endpoints.iter().enumerate() {
            let path = format!("endpoints[{}]", idx);
            if !endpoint.name.is_empty() && !seen.insert(endpoint.name.as_str()) {
                result.add_error(ValidationError::new(
                    format!("{}.name", path),
                    format!("Duplicate endpoint name '{}'", endpoint.name),
                ));
            }
            Self::validate_endpoint(config, endpoint, &path, &mut result);
        }

        Ok(result)
    }

    fn validate_globals(config: &Config, result: &mut ValidationResult) {
        if config.endpoints.is_empty() {
            result.add_warning(ValidationWarning::new(
                "endpoints",
                "No endpoints configured, nothing will be monitored",
            ));
        }

        if !VERBOSITY_LEVELS.contains(&config.verbosity.to_ascii_lowercase().as_str()) {
            result.add_warning(ValidationWarning::new(
                "verbosity",
                format!(
                    "Unknown verbosity '{}', falling back to info (valid values: {:?})",
                    config.verbosity, VERBOSITY_LEVELS
                ),
            ));
        }

        if config.rpc_timeout.is_zero() {
            result.add_error(ValidationError::new(
                "rpc_timeout",
                "rpc_timeout must be greater than 0",
            ));
        }

        if let Some(ref pd) = config.pagerduty {
            Self::validate_pagerduty(pd, "pagerduty", result);
        }
        if let Some(ref slack) = config.slack {
            Self::validate_slack(slack, "slack", result);
        }
    }

    fn validate_endpoint(
        config: &Config,
        endpoint: &EndpointConfig,
        path: &str,
        result: &mut ValidationResult,
    ) {
        if endpoint.name.is_empty() {
            result.add_error(ValidationError::new(
                format!("{}.name", path),
                "Endpoint name cannot be empty",
            ));
        }

        if endpoint.url.is_empty() {
            result.add_error(ValidationError::new(
                format!("{}.url", path),
                "Endpoint URL cannot be empty",
            ));
        } else if let Err(e) = url::Url::parse(&endpoint.url) {
            result.add_error(ValidationError::new(
                format!("{}.url", path),
                format!("Invalid endpoint URL '{}': {}", endpoint.url, e),
            ));
        }

        if endpoint.poll_duration.is_zero() {
            result.add_error(ValidationError::new(
                format!("{}.poll_duration", path),
                "poll_duration must be greater than 0",
            ));
        }

        if endpoint.new_block_max_duration.is_zero() {
            result.add_error(ValidationError::new(
                format!("{}.new_block_max_duration", path),
                "new_block_max_duration must be greater than 0",
            ));
        } else if endpoint.poll_duration >= endpoint.new_block_max_duration {
            result.add_warning(ValidationWarning::new(
                format!("{}.poll_duration", path),
                "poll_duration is not shorter than new_block_max_duration, stalls will be reported late",
            ));
        }

        if let Some(ref pd) = endpoint.pagerduty {
            Self::validate_pagerduty(pd, &format!("{}.pagerduty", path), result);
        }
        if let Some(ref slack) = endpoint.slack {
            Self::validate_slack(slack, &format!("{}.slack", path), result);
        }

        let usable_pagerduty = [endpoint.pagerduty.as_ref(), config.pagerduty.as_ref()]
            .into_iter()
            .flatten()
            .any(PagerDutyConfig::is_usable);
        let usable_slack = [endpoint.slack.as_ref(), config.slack.as_ref()]
            .into_iter()
            .flatten()
            .any(SlackConfig::is_usable);
        if !usable_pagerduty && !usable_slack {
            result.add_warning(ValidationWarning::new(
                path,
                format!(
                    "No alert channel is enabled for endpoint '{}', failures will only be logged",
                    endpoint.name
                ),
            ));
        }
    }

    fn validate_pagerduty(pd: &PagerDutyConfig, path: &str, result: &mut ValidationResult) {
        if pd.enabled && !pd.is_complete() {
            result.add_warning(ValidationWarning::new(
                format!("{}.routing_key", path),
                "PagerDuty is enabled but routing_key is empty, the block will be ignored",
            ));
        }
    }

    fn validate_slack(slack: &SlackConfig, path: &str, result: &mut ValidationResult) {
        if slack.enabled && !slack.is_complete() {
            result.add_warning(ValidationWarning::new(
                path,
                "Slack is enabled but neither webhook_url nor channel and token are set, the block will be ignored",
            ));
        }

        if slack.has_webhook() && !slack.webhook_url.starts_with("https://") {
            result.add_warning(ValidationWarning::new(
                format!("{}.webhook_url", path),
                "Slack webhook_url is not an https:// URL",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
