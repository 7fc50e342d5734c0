//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::StaveConfig;
use std::path::Path;

/// File name looked up inside a project directory.
pub const CONFIG_FILE_NAME: &str = "stave.toml";

/// Loads and validates `stave.toml` from a project directory.
///
/// A missing file is not an error: the default configuration is returned.
pub fn load_config(project_dir: &Path) -> Result<StaveConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(StaveConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `stave.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<StaveConfig, ConfigError> {
    let config: StaveConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &StaveConfig) -> Result<(), ConfigError> {
    let session = &config.session;
    if session.max_path_count == 0 {
        return Err(ConfigError::InvalidSetting {
            key: "max_path_count",
            reason: "must be at least 1",
        });
    }
    if matches!(session.corner.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(ConfigError::InvalidSetting {
            key: "corner",
            reason: "must not be empty",
        });
    }
    Ok(())
}
