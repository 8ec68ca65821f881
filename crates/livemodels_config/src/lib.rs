//! Parsing and validation of `models.toml` live-models configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`ModelsConfig`] describing where the model cache lives, where companion
//! sources are found, and how the build and watcher behave.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
