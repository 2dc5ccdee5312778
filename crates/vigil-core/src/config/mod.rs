//! Configuration loading and saving.

mod agent;
pub mod serde_utils;

pub use agent::{AgentConfig, ReconnectConfig};

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Loads a TOML configuration file.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Saves a TOML configuration file, creating parent directories as needed.
pub fn save_config<T: Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Default directory for configuration files.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("vigil"))
        .unwrap_or_else(|| PathBuf::from(".vigil"))
}

/// Default directory for runtime state such as the credential lock file.
pub fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("vigil"))
        .unwrap_or_else(|| PathBuf::from(".vigil"))
}
