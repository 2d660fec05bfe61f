//! CLI definitions for nodewatch.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// nodewatch CLI.
#[derive(Parser, Debug)]
#[command(name = "nodewatch")]
#[command(about = "Liveness monitor for Ethereum execution and consensus nodes")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (YAML, JSON or TOML, chosen by extension)
    #[arg(short, long, env = "NODEWATCH_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Inline configuration document, JSON or YAML. Takes precedence over --config
    #[arg(long, env = "NODEWATCH_CONFIG_INLINE")]
    pub config_inline: Option<String>,

    /// Also write logs to daily rotated files in this directory
    #[arg(long, env = "NODEWATCH_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log line format
    #[arg(long, value_enum, env = "NODEWATCH_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Validate the configuration, print the resolved monitors and exit
    #[arg(long)]
    pub check: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}
