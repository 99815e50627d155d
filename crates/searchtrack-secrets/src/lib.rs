//! Encrypted API-key storage for SearchTrack.
//!
//! A passphrase is stretched with PBKDF2-HMAC-SHA256 into an AES-256-GCM key,
//! the key encrypts a single provider credential, and the ciphertext lives in
//! a single slot of a durable key-value store. Unlocked plaintext is kept in a
//! [`SessionCache`] that forgets it after a period of inactivity.

pub mod crypto;
pub mod error;
pub mod kdf;
pub mod session;
pub mod store;
pub mod types;
pub mod vault;

pub use error::{Result, SecretError};
pub use kdf::{DerivedKey, Salt};
pub use session::SessionCache;
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SecretStore};
pub use types::{EncryptedSecretRecord, SessionSecret};
pub use vault::SecureStorage;
