//! Parsing and validation of `star.toml` reporting configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`StarConfig`], then resolves it into the pre-validated [`Settings`] object
//! consumed by the aggregation core, substituting documented defaults for any
//! absent timing setting.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_settings, validate_environment, Settings, ToolEnvironment};
pub use types::*;
