//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ModelsConfig;
use std::path::Path;

/// Name of the configuration file inside the host's root directory.
pub const CONFIG_FILE: &str = "models.toml";

/// Loads and validates `models.toml` from a directory.
pub fn load_config(dir: &Path) -> Result<ModelsConfig, ConfigError> {
    let content = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates a `models.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ModelsConfig, ConfigError> {
    let config: ModelsConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ModelsConfig) -> Result<(), ConfigError> {
    if config.models.cache_dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("models.cache_dir".to_string()));
    }
    if config.models.namespace.is_empty() {
        return Err(ConfigError::MissingField("models.namespace".to_string()));
    }
    let ext = &config.models.companion_extension;
    if ext.is_empty() || ext.starts_with('.') {
        return Err(ConfigError::ValidationError(format!(
            "models.companion_extension must be a bare extension, got '{ext}'"
        )));
    }
    if config.models.cache_dir == config.models.companion_dir {
        return Err(ConfigError::ValidationError(
            "models.cache_dir and models.companion_dir must differ".to_string(),
        ));
    }
    Ok(())
}
