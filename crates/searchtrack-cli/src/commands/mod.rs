//! CLI command implementations.

pub mod config;
pub mod doctor;
pub mod key;
pub mod refine;

use searchtrack_core::Config;
use std::path::Path;

/// Load and validate the config named on the command line, or the default
/// one.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::load_or_default(path)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    Ok(config)
}
