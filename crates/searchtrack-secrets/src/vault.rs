//! Password-locked access to the stored credential.

use searchtrack_core::{ProviderKind, SecretString};
use tracing::{debug, info};

use crate::crypto;
use crate::error::{Result, SecretError};
use crate::kdf::{self, DerivedKey};
use crate::store::{KeyValueStore, SecretStore};

/// Encrypts and decrypts the credential with a key derived from the user's
/// password.
///
/// The derived key lives only inside this value. Dropping it, or calling
/// [`SecureStorage::lock`], zeroizes the key.
pub struct SecureStorage<S> {
    store: SecretStore<S>,
    key: Option<DerivedKey>,
}

impl<S: KeyValueStore> SecureStorage<S> {
    pub fn new(kv: S) -> Self {
        Self {
            store: SecretStore::new(kv),
            key: None,
        }
    }

    pub fn store(&self) -> &SecretStore<S> {
        &self.store
    }

    /// Derive the encryption key from `passphrase`.
    ///
    /// A wrong password is not detected here; it surfaces as
    /// [`SecretError::Authentication`] on the next [`SecureStorage::api_key`].
    pub async fn initialize(&mut self, passphrase: SecretString) -> Result<()> {
        let salt = self.store.salt().await?;
        let key = kdf::derive_key_async(passphrase, salt).await?;
        self.key = Some(key);
        debug!("secure storage initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.key.is_some()
    }

    fn key(&self) -> Result<&DerivedKey> {
        self.key.as_ref().ok_or(SecretError::NotInitialized)
    }

    /// Encrypt `api_key` and persist it as the credential for `provider`.
    pub async fn store_api_key(&self, provider: ProviderKind, api_key: &SecretString) -> Result<()> {
        let record = crypto::encrypt(self.key()?, api_key.expose_secret())?;
        self.store.save(provider, &record).await?;
        info!(%provider, "API key stored securely");
        Ok(())
    }

    /// Load and decrypt the stored credential.
    pub async fn api_key(&self) -> Result<Option<(ProviderKind, SecretString)>> {
        let key = self.key()?;
        let Some((provider, record)) = self.store.load().await? else {
            return Ok(None);
        };
        let api_key = crypto::decrypt(key, &record)?;
        Ok(Some((provider, api_key)))
    }

    /// Whether an encrypted credential exists. Works while locked.
    pub async fn has_stored_key(&self) -> Result<bool> {
        self.store.has_key().await
    }

    /// Forget the derived key.
    pub fn lock(&mut self) {
        if self.key.take().is_some() {
            debug!("secure storage locked");
        }
    }

    /// Remove the stored credential. Works while locked.
    pub async fn clear_all(&self) -> Result<()> {
        self.store.clear().await?;
        info!("stored API key cleared");
        Ok(())
    }
}
