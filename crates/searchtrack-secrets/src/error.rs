//! Error types for secret management.

use thiserror::Error;

/// Errors that can occur during secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The key-derivation backend could not run (RNG or worker failure).
    #[error("cannot process password: {0}")]
    Derivation(String),

    /// The AEAD tag did not verify.
    #[error("wrong password or corrupted data")]
    Authentication,

    /// The stored record is not something this crate wrote.
    #[error("stored secret is corrupted: {0}")]
    MalformedRecord(String),

    #[error("secure storage is locked; enter the password first")]
    NotInitialized,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SecretError {
    /// Whether the user can recover by re-entering the password.
    pub fn is_wrong_password(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Whether the stored record must be cleared and saved again.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::MalformedRecord(_))
    }
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;
