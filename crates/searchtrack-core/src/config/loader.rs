//! Configuration loading and persistence.

use super::Config;
use crate::error::ConfigError;
use crate::paths;
use crate::provider::ProviderKind;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest accepted inactivity timeout (one day).
pub const MAX_INACTIVITY_TIMEOUT_MINUTES: u64 = 24 * 60;

/// Longest accepted spacing between health checks (30 days).
pub const MAX_HEALTH_INTERVAL_HOURS: u64 = 30 * 24;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load from `path` (or the default location), falling back to defaults
    /// when no file exists. Parse and IO errors are still reported.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let result = match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        };

        match result {
            Err(ConfigError::NotFound(missing)) => {
                tracing::debug!(path = %missing.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; plain JSON is valid JSON5.
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolved path of the durable key-value store.
    pub fn storage_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.path {
            Some(path) => Ok(paths::expand_tilde(&path.to_string_lossy())),
            None => paths::storage_file(),
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        // 1. Inactivity timeout must be positive and at most a day
        if self.session.inactivity_timeout_minutes == 0 {
            errors.push("Session inactivity timeout must be greater than 0".to_string());
        }
        if self.session.inactivity_timeout_minutes > MAX_INACTIVITY_TIMEOUT_MINUTES {
            errors.push(format!(
                "Session inactivity timeout {} minutes exceeds maximum of {}",
                self.session.inactivity_timeout_minutes, MAX_INACTIVITY_TIMEOUT_MINUTES
            ));
        }

        // 2. Health check interval
        if self.health_check.enabled && self.health_check.interval_hours == 0 {
            errors.push("Health check interval must be greater than 0 hours".to_string());
        }
        if self.health_check.interval_hours > MAX_HEALTH_INTERVAL_HOURS {
            errors.push(format!(
                "Health check interval {} hours exceeds maximum of {}",
                self.health_check.interval_hours, MAX_HEALTH_INTERVAL_HOURS
            ));
        }

        // 3. Provider base URL overrides
        for (provider, url) in &self.providers.base_urls {
            if provider.parse::<ProviderKind>().is_err() {
                errors.push(format!("Unknown provider in base_urls: '{}'", provider));
            }
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                errors.push(format!(
                    "Base URL for '{}' must start with http:// or https://, got '{}'",
                    provider, url
                ));
            }
        }

        if self.providers.timeout_seconds == 0 {
            errors.push("Provider timeout must be greater than 0 seconds".to_string());
        }

        // 4. Refinement parameters
        if self.refine.model.trim().is_empty() {
            errors.push("Refine model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.refine.temperature) {
            errors.push(format!(
                "Refine temperature must be between 0.0 and 2.0, got {}",
                self.refine.temperature
            ));
        }
        if self.refine.max_tokens == 0 {
            errors.push("Refine max_tokens must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
