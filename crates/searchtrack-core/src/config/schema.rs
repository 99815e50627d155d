//! Configuration schema definitions.

use crate::provider::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main SearchTrack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session cache settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Background credential health check.
    #[serde(default)]
    pub health_check: HealthCheckConfig,

    /// Durable storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote provider settings.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Query refinement settings.
    #[serde(default)]
    pub refine: RefineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes without activity before the unlocked key is dropped.
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_minutes: u64,
}

fn default_inactivity_timeout() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_minutes: default_inactivity_timeout(),
        }
    }
}

impl SessionConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_minutes.saturating_mul(60))
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hours between checks once a key has been unlocked.
    #[serde(default = "default_health_interval")]
    pub interval_hours: u64,
}

fn default_true() -> bool {
    true
}

fn default_health_interval() -> u64 {
    24
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: default_health_interval(),
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
    }
}

/// Durable storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store file path. Defaults to `~/.searchtrack/storage.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Remote provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Provider selected when none is given explicitly.
    #[serde(default)]
    pub default: ProviderKind,

    /// API base URL overrides (e.g. a proxy), keyed by provider id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub base_urls: HashMap<String, String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}

impl ProvidersConfig {
    /// Base URL override for `provider`, if configured.
    pub fn base_url(&self, provider: ProviderKind) -> Option<&str> {
        self.base_urls.get(provider.as_str()).map(String::as_str)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: ProviderKind::default(),
            base_urls: HashMap::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Query refinement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineConfig {
    #[serde(default = "default_refine_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_refine_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    100
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            model: default_refine_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
