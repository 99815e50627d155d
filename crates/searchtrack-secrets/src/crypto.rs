//! AES-256-GCM encryption of the stored credential.
//!
//! A fresh random nonce is drawn for every call and prepended to the
//! ciphertext, so the stored record is self-contained:
//! `base64(nonce || ciphertext || tag)`.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use searchtrack_core::SecretString;

use crate::error::{Result, SecretError};
use crate::kdf::DerivedKey;
use crate::types::EncryptedSecretRecord;

/// AES-GCM nonce length (96 bits).
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`.
///
/// Two calls with the same key and plaintext yield different records.
pub fn encrypt(key: &DerivedKey, plaintext: &str) -> Result<EncryptedSecretRecord> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| SecretError::EncryptionFailed(format!("secure random source unavailable: {e}")))?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(EncryptedSecretRecord::from_bytes(&result))
}

/// Decrypt a record produced by [`encrypt`].
///
/// Records too short to hold a nonce and tag are rejected as malformed
/// before any decryption is attempted. A tag mismatch (wrong passphrase or
/// tampered bytes) is [`SecretError::Authentication`].
pub fn decrypt(key: &DerivedKey, record: &EncryptedSecretRecord) -> Result<SecretString> {
    let encrypted = record.decode()?;
    if encrypted.len() < NONCE_SIZE + TAG_SIZE {
        return Err(SecretError::MalformedRecord(format!(
            "record is {} bytes, shorter than nonce and tag ({} bytes)",
            encrypted.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| SecretError::MalformedRecord(e.to_string()))?;

    let nonce = Nonce::from_slice(nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| SecretError::Authentication)?;

    let value = String::from_utf8(plaintext)
        .map_err(|e| SecretError::MalformedRecord(format!("invalid UTF-8: {e}")))?;
    Ok(SecretString::new(value))
}
