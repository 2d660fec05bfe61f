//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            "" => Err(ConfigError::UnsupportedFormat(format!(
                "{} has no extension",
                path.display()
            ))),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Guess the format of an inline document: JSON objects start with `{`,
    /// anything else is read as YAML.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            ConfigFormat::Json
        } else {
            ConfigFormat::Yaml
        }
    }
}

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, choosing the parser by extension.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let expanded_path = Self::expand_path(&path.to_string_lossy());
        let path = Path::new(&expanded_path);
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        Self::load_str(&content, format)
    }

    /// Load configuration passed inline, e.g. from a command line flag.
    pub fn load_inline(content: &str) -> Result<Config, ConfigError> {
        Self::load_str(content, ConfigFormat::detect(content))
    }

    /// Load configuration from a string in the given format.
    pub fn load_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config = match format {
            ConfigFormat::Yaml if expanded.trim().is_empty() => Config::default(),
            ConfigFormat::Yaml => serde_yml::from_str(&expanded)?,
            ConfigFormat::Json => serde_json::from_str(&expanded)?,
            ConfigFormat::Toml => toml::from_str(&expanded)?,
        };
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EndpointKind;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::Builder;

    const YAML: &str = r##"
verbosity: debug
rpc_timeout: 5s
slack:
  enabled: true
  webhook_url: https://hooks.slack.com/services/global
pagerduty:
  enabled: true
  routing_key: global-key
  service: node-fleet
endpoints:
  - name: geth-mainnet
    url: http://localhost:8545
    type: execution
    new_block_max_duration: 1m
    poll_duration: 12s
    min_peers: 5
  - name: lighthouse
    url: http://localhost:5052
    type: consensus
    slack:
      enabled: true
      channel: "#beacon"
      token: xoxb-1
"##;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("", ConfigFormat::Yaml).unwrap();
        assert!(config.endpoints.is_empty());
        assert_eq!(config.verbosity, "info");
        assert_eq!(config.rpc_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_load_yaml_config() {
        let config = ConfigLoader::load_str(YAML, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.verbosity, "debug");
        assert_eq!(config.rpc_timeout, Duration::from_secs(5));
        assert_eq!(config.endpoints.len(), 2);

        let geth = &config.endpoints[0];
        assert_eq!(geth.kind, EndpointKind::Execution);
        assert_eq!(geth.new_block_max_duration, Duration::from_secs(60));
        assert_eq!(geth.poll_duration, Duration::from_secs(12));
        assert_eq!(geth.min_peers, 5);
        assert!(geth.slack.is_none());

        let beacon = &config.endpoints[1];
        assert_eq!(beacon.kind, EndpointKind::Consensus);
        assert_eq!(beacon.poll_duration, Duration::from_secs(10));
        let slack = beacon.slack.as_ref().unwrap();
        assert!(slack.has_api_credentials());
        assert!(!slack.has_webhook());

        let pd = config.pagerduty.as_ref().unwrap();
        assert_eq!(pd.routing_key, "global-key");
    }

    #[test]
    fn test_load_json_inline() {
        let content = r#"{
            "endpoints": [
                {"name": "reth", "url": "http://reth:8545", "kind": "execution", "poll_duration": "2s"}
            ]
        }"#;
        let config = ConfigLoader::load_inline(content).unwrap();
        assert_eq!(config.endpoints[0].name, "reth");
        assert_eq!(config.endpoints[0].poll_duration, Duration::from_secs(2));
    }

    #[test]
    fn test_load_yaml_inline() {
        let content = "endpoints:\n  - {name: a, url: 'http://a', type: consensus}\n";
        let config = ConfigLoader::load_inline(content).unwrap();
        assert_eq!(config.endpoints[0].kind, EndpointKind::Consensus);
    }

    #[test]
    fn test_load_toml_config() {
        let content = r#"
            verbosity = "warn"

            [[endpoints]]
            name = "nethermind"
            url = "http://localhost:8545"
            type = "execution"
            min_peers = 10
        "#;
        let config = ConfigLoader::load_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.verbosity, "warn");
        assert_eq!(config.endpoints[0].min_peers, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{}", YAML).unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.endpoints.len(), 2);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.yaml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_unknown_extension() {
        let file = Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::load(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_unknown_endpoint_kind() {
        let content = "endpoints:\n  - {name: a, url: 'http://a', type: archive}\n";
        let result = ConfigLoader::load_str(content, ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::YamlParse(_))));
    }

    #[test]
    fn test_load_invalid_duration() {
        let content =
            "endpoints:\n  - {name: a, url: 'http://a', type: execution, poll_duration: soon}\n";
        assert!(ConfigLoader::load_str(content, ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_format_detect() {
        assert_eq!(ConfigFormat::detect("  {\"a\": 1}"), ConfigFormat::Json);
        assert_eq!(ConfigFormat::detect("a: 1"), ConfigFormat::Yaml);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("c.YML")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("c.json")).unwrap(), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("c.toml")).unwrap(), ConfigFormat::Toml);
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("NODEWATCH_TEST_ROUTING_KEY", "rk-123");
        }
        let content = "pagerduty:\n  enabled: true\n  routing_key: ${NODEWATCH_TEST_ROUTING_KEY}\n";
        let config = ConfigLoader::load_str(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.pagerduty.unwrap().routing_key, "rk-123");
        unsafe {
            std::env::remove_var("NODEWATCH_TEST_ROUTING_KEY");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value: \"${NONEXISTENT_TEST_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value: \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/etc/nodewatch/config.yaml";
        assert_eq!(ConfigLoader::expand_path(path), path);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/config.yaml");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/config.yaml"));
    }
}
