//! # nodewatch Config
//!
//! Configuration management for nodewatch: the endpoint list, global and
//! per-endpoint alert channel settings, and loading from YAML, JSON or TOML.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{ConfigFormat, ConfigLoader};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
