//! Core types for secret management.
//!
//! The encrypted (at-rest) record and the decrypted session copy of the
//! credential.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use searchtrack_core::{ProviderKind, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SecretError};

/// An encrypted credential as persisted in the durable store.
///
/// Holds `base64(nonce || ciphertext || tag)`. The wrapper only guarantees
/// the string came from storage or from [`crate::crypto::encrypt`]; shape
/// checks happen in [`EncryptedSecretRecord::decode`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedSecretRecord(String);

impl EncryptedSecretRecord {
    /// Encode raw `nonce || ciphertext || tag` bytes for storage.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Wrap a base64 string read back from storage.
    pub fn from_base64(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.0.as_bytes())
            .map_err(|e| SecretError::MalformedRecord(format!("record is not valid base64: {e}")))
    }
}

impl fmt::Debug for EncryptedSecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedSecretRecord({} chars)", self.0.len())
    }
}

/// The unlocked credential held for the current browser session.
///
/// Every clone zeroizes its own copy of the key on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSecret {
    /// Plaintext API key.
    pub api_key: SecretString,

    /// Provider the key authenticates against.
    pub provider: ProviderKind,

    /// When the key was unlocked in this session.
    pub unlocked_at: DateTime<Utc>,
}

impl SessionSecret {
    pub fn new(api_key: impl Into<SecretString>, provider: ProviderKind) -> Self {
        Self {
            api_key: api_key.into(),
            provider,
            unlocked_at: Utc::now(),
        }
    }
}
