//! # nodewatch daemon
//!
//! Process lifecycle for the node monitor.
//!
//! ## Features
//!
//! - Signal handling (SIGTERM/SIGINT, Ctrl+C elsewhere) for graceful shutdown
//! - One monitor task per endpoint signal, supervised in a single join set
//! - Fail-fast shutdown when a monitor dies on its own
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nodewatch_daemon::{ShutdownSignal, Supervisor};
//!
//! let shutdown = ShutdownSignal::new();
//! shutdown.setup_os_signals()?;
//! Supervisor::new(Arc::new(config)).run(shutdown.token()).await?;
//! ```

pub mod error;
pub mod signal;
pub mod supervisor;

pub use error::DaemonError;
pub use signal::ShutdownSignal;
pub use supervisor::{ClientFactory, HttpClientFactory, Supervisor, monitor_name};
