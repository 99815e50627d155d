//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the SearchTrack base directory (~/.searchtrack).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".searchtrack"))
}

/// Get the main config file path (~/.searchtrack/searchtrack.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("searchtrack.json5"))
}

/// Get the durable key-value store path (~/.searchtrack/storage.json).
pub fn storage_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("storage.json"))
}

/// Ensure the base directory exists.
pub fn ensure_dirs() -> Result<(), ConfigError> {
    std::fs::create_dir_all(base_dir()?)?;
    Ok(())
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
