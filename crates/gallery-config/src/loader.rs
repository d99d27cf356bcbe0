//! Configuration file loading and validation
//!
//! - [`load_config`] - Strict loader, errors if the file is missing
//! - [`load_config_from_str`] - Parse and validate TOML content
//! - [`create_config`] - Write the default template (used by `gallery init`)

use crate::Config;
use std::path::{Path, PathBuf};
use tracing::debug;

include!(concat!(env!("OUT_DIR"), "/embedded_configs.rs"));

/// Errors that can occur during config loading
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    #[error("Config file not found: {0}. Run 'gallery init' to create a default config.")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file (strict, no side effects)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError::NotFound)` - Config file does not exist
/// * `Err(ConfigError)` - Failed to read, parse or validate
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    debug!(path = %path.display(), "Loading config file");
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a TOML string
pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Write the default configuration template to `path`
///
/// Does nothing if the file already exists.
pub fn create_config(path: &Path) -> Result<PathBuf, std::io::Error> {
    if path.exists() {
        debug!(path = %path.display(), "Config file already exists");
        return Ok(path.to_path_buf());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    debug!(path = %path.display(), "Writing config file");
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(path.to_path_buf())
}
