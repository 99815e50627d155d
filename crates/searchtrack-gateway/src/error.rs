//! Gateway error types.

use searchtrack_core::ConfigError;
use searchtrack_secrets::SecretError;
use thiserror::Error;

use crate::messages::Action;

/// Errors that can occur while dispatching messages.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No handler registered for the action.
    #[error("No handler for action: {0}")]
    MethodNotFound(Action),

    /// Invalid parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Secret storage failure.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Rejected coordinator settings.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The background coordinator has shut down.
    #[error("background coordinator is not running")]
    CoordinatorClosed,

    /// A handler answered with the wrong response type.
    #[error("Unexpected response to {0}")]
    UnexpectedResponse(Action),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Short machine-readable error kind, used in JSON replies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Json(_) => "parse_error",
            Self::MethodNotFound(_) => "method_not_found",
            Self::InvalidParams(_) => "invalid_params",
            Self::Secret(_) => "secret_error",
            Self::Config(_) => "config_error",
            Self::CoordinatorClosed => "coordinator_closed",
            Self::UnexpectedResponse(_) | Self::Internal(_) => "internal_error",
        }
    }
}
