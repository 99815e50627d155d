//! # searchtrack-core
//!
//! Core types, configuration, and utilities for SearchTrack.
//!
//! This crate provides shared functionality used across all SearchTrack crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the config file
//! - **Types**: The provider selector shared by storage, messaging, and validation
//! - **Utilities**: Path resolution and zeroizing secret strings

pub mod config;
pub mod error;
pub mod paths;
pub mod provider;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use provider::ProviderKind;
pub use secret::SecretString;
