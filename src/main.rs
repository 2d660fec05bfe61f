//! nodewatch - liveness monitoring for Ethereum nodes
//!
//! Main entry point: loads the configuration, sets up logging and signals,
//! and runs one monitor per endpoint signal until shutdown.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use nodewatch_config::{
    Config, ConfigError, ConfigLoader, ConfigValidator, VERBOSITY_LEVELS, ValidationWarning,
};
use nodewatch_daemon::{DaemonError, ShutdownSignal, Supervisor};
use nodewatch_monitor::resolve_channels;

use crate::cli::{Cli, LogFormat};

/// Filter directive for the configured verbosity; unknown levels fall back to info.
fn verbosity_directive(verbosity: &str) -> String {
    let level = verbosity.trim().to_ascii_lowercase();
    if VERBOSITY_LEVELS.contains(&level.as_str()) {
        level
    } else {
        "info".to_string()
    }
}

/// Initialize tracing with console output and, optionally, a rolling log file.
///
/// `RUST_LOG` overrides the configured verbosity.
fn init_tracing(
    verbosity: &str,
    format: LogFormat,
    log_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbosity)));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("nodewatch")
                .filename_suffix("log")
                .max_log_files(14)
                .build(dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Keep the writer alive for the program duration
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    let (text_layer, json_layer) = match format {
        LogFormat::Text => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(true))),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Load and validate the configuration named on the command line.
fn load_config(cli: &Cli) -> Result<(Config, Vec<ValidationWarning>), ConfigError> {
    let config = match &cli.config_inline {
        Some(doc) => ConfigLoader::load_inline(doc)?,
        None => ConfigLoader::load(&cli.config)?,
    };

    let warnings = ConfigValidator::validate(&config)?.into_result()?;
    Ok((config, warnings))
}

/// Print the monitors and channels a configuration resolves to.
fn print_plan(config: &Config, supervisor: &Supervisor) -> Result<(), DaemonError> {
    let monitors = supervisor.build()?;

    println!(
        "Configuration OK: {} endpoint(s), {} monitor(s)",
        config.endpoints.len(),
        monitors.len()
    );
    for endpoint in &config.endpoints {
        let channels: Vec<String> = resolve_channels(endpoint, config)
            .iter()
            .map(|b| b.describe())
            .collect();
        let channels = if channels.is_empty() {
            "none (log only)".to_string()
        } else {
            channels.join(", ")
        };

        println!("\n{} ({}, {})", endpoint.name, endpoint.kind, endpoint.url);
        println!("  alerts: {}", channels);
        for monitor in monitors.iter().filter(|m| m.endpoint() == endpoint.name) {
            println!("  - {} every {:?}", monitor.name(), monitor.poll_interval());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, warnings) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("nodewatch: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.verbosity, cli.log_format, cli.log_dir.as_deref())?;

    for warning in &warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }

    let config = Arc::new(config);
    let supervisor = Supervisor::new(config.clone());

    if cli.check {
        if let Err(e) = print_plan(&config, &supervisor) {
            eprintln!("nodewatch: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoints = config.endpoints.len(),
        "Starting nodewatch"
    );

    let shutdown = ShutdownSignal::new();
    shutdown.setup_os_signals()?;

    match supervisor.run(shutdown.token()).await {
        Ok(()) => {
            info!("nodewatch stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "nodewatch stopped on a fatal error");
            std::process::exit(1);
        }
    }
}
