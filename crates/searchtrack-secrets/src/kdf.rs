//! Passphrase → AES-256 key derivation (PBKDF2-HMAC-SHA256).

use rand::rngs::OsRng;
use rand::RngCore;
use searchtrack_core::SecretString;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SecretError};

/// PBKDF2 iteration count. Changing it orphans every stored record.
pub const ITERATIONS: u32 = 100_000;

/// Derived key length in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// Per-installation PBKDF2 salt.
///
/// Not secret. Generated once and persisted beside the encrypted record so a
/// later session can re-derive the same key from the same passphrase.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Draw a fresh salt from the OS random source.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SecretError::Derivation(format!("secure random source unavailable: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a salt previously written with [`Salt::to_hex`].
    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = hex::decode(value)
            .map_err(|e| SecretError::MalformedRecord(format!("salt is not hex: {e}")))?;
        let bytes: [u8; SALT_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            SecretError::MalformedRecord(format!(
                "salt must be {SALT_SIZE} bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.to_hex())
    }
}

/// A 256-bit symmetric key derived from a passphrase.
///
/// Held in memory only by the component that derived it; zeroized on drop
/// and never serialized.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the encryption key for `passphrase` under `salt`.
///
/// Deterministic: equal inputs always produce equal keys. CPU-bound; async
/// callers should go through [`derive_key_async`].
pub fn derive_key(passphrase: &SecretString, salt: &Salt) -> DerivedKey {
    let mut bytes = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        passphrase.expose_secret().as_bytes(),
        salt.as_bytes(),
        ITERATIONS,
        &mut bytes,
    );
    DerivedKey { bytes }
}

/// Run [`derive_key`] on the blocking pool.
pub async fn derive_key_async(passphrase: SecretString, salt: Salt) -> Result<DerivedKey> {
    tokio::task::spawn_blocking(move || derive_key(&passphrase, &salt))
        .await
        .map_err(|e| SecretError::Derivation(format!("key derivation task failed: {e}")))
}
