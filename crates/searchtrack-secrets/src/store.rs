//! Durable storage for the encrypted credential.
//!
//! [`KeyValueStore`] is the flat JSON namespace the whole application shares
//! (the `storage.local` analogue). [`SecretStore`] layers the single-slot
//! credential record on top of it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use searchtrack_core::ProviderKind;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{Result, SecretError};
use crate::kdf::Salt;
use crate::types::EncryptedSecretRecord;

/// Durable key naming the provider whose record is stored.
pub const PROVIDER_KEY: &str = "llm_provider";

/// Durable key holding the per-installation PBKDF2 salt (hex).
pub const SALT_KEY: &str = "secure_storage_salt";

/// Async key-value backend with JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read one key. Missing keys are `None`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write several keys in one atomic step.
    async fn set(&self, items: Vec<(String, Value)>) -> Result<()>;

    /// Remove keys. Keys that do not exist are ignored.
    async fn remove(&self, keys: &[String]) -> Result<()>;

    /// Remove `remove` and write `items` in one atomic step. Readers see
    /// either the old or the new state, never a mix.
    async fn replace(&self, items: Vec<(String, Value)>, remove: &[String]) -> Result<()>;

    /// Return the value under `key`, first storing `value` there if the key
    /// is missing. Concurrent callers all observe the same winner.
    async fn get_or_insert(&self, key: &str, value: Value) -> Result<Value>;

    /// All keys currently present, sorted.
    async fn keys(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, items: Vec<(String, Value)>) -> Result<()> {
        (**self).set(items).await
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        (**self).remove(keys).await
    }

    async fn replace(&self, items: Vec<(String, Value)>, remove: &[String]) -> Result<()> {
        (**self).replace(items, remove).await
    }

    async fn get_or_insert(&self, key: &str, value: Value) -> Result<Value> {
        (**self).get_or_insert(key, value).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        (**self).keys().await
    }
}

/// In-process store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, items: Vec<(String, Value)>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn replace(&self, items: Vec<(String, Value)>, remove: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in remove {
            entries.remove(key);
        }
        entries.extend(items);
        Ok(())
    }

    async fn get_or_insert(&self, key: &str, value: Value) -> Result<Value> {
        let mut entries = self.entries.write().await;
        Ok(entries.entry(key.to_string()).or_insert(value).clone())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// A single JSON document on disk.
///
/// Every mutation rewrites the whole document through a uniquely named temp
/// file and a rename, so a crash leaves either the old or the new contents,
/// and writers in separate processes never share a temp file. The file is
/// created with mode `0600` on Unix.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) if data.trim().is_empty() => Ok(Map::new()),
            Ok(data) => match serde_json::from_str::<Value>(&data)? {
                Value::Object(map) => Ok(map),
                _ => Err(SecretError::StorageError(format!(
                    "{} does not contain a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(map)?;
        let temp_path = self
            .path
            .with_extension(format!("{:08x}.tmp", rand::random::<u32>()));
        write_private_file(&temp_path, json.as_bytes()).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), keys = map.len(), "wrote storage file");
        Ok(())
    }
}

/// Write `data` to `path` with mode 0600 on Unix.
async fn write_private_file(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(path, perms).await?;
    }

    Ok(())
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, items: Vec<(String, Value)>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        map.extend(items);
        self.write_all(&map).await
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        let before = map.len();
        for key in keys {
            map.remove(key);
        }
        if map.len() == before {
            return Ok(());
        }
        self.write_all(&map).await
    }

    async fn replace(&self, items: Vec<(String, Value)>, remove: &[String]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        for key in remove {
            map.remove(key);
        }
        map.extend(items);
        self.write_all(&map).await
    }

    async fn get_or_insert(&self, key: &str, value: Value) -> Result<Value> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        if let Some(existing) = map.get(key) {
            return Ok(existing.clone());
        }
        map.insert(key.to_string(), value.clone());
        self.write_all(&map).await?;
        Ok(value)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut keys: Vec<String> = self.read_all().await?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// The single-slot encrypted credential record.
///
/// At most one provider's record exists at a time: saving for one provider
/// removes every other provider's record.
pub struct SecretStore<S> {
    kv: S,
}

impl<S: KeyValueStore> SecretStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// The underlying key-value backend.
    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Persist `record` as the credential for `provider`.
    ///
    /// The record, the selector and the removal of other providers' records
    /// land in one backend write. Concurrent saves resolve to whichever
    /// write lands last.
    pub async fn save(&self, provider: ProviderKind, record: &EncryptedSecretRecord) -> Result<()> {
        let stale: Vec<String> = ProviderKind::ALL
            .iter()
            .filter(|p| **p != provider)
            .map(|p| p.record_key())
            .collect();

        self.kv
            .replace(
                vec![
                    (
                        provider.record_key(),
                        Value::String(record.as_str().to_string()),
                    ),
                    (
                        PROVIDER_KEY.to_string(),
                        Value::String(provider.as_str().to_string()),
                    ),
                ],
                &stale,
            )
            .await?;

        debug!(%provider, "saved encrypted credential");
        Ok(())
    }

    /// Load the stored record, if any.
    ///
    /// Without a provider selector the record is looked up under the OpenAI
    /// key, which is where installations predating the selector kept it.
    pub async fn load(&self) -> Result<Option<(ProviderKind, EncryptedSecretRecord)>> {
        let provider = match self.kv.get(PROVIDER_KEY).await? {
            None => ProviderKind::OpenAi,
            Some(Value::String(name)) => name.parse::<ProviderKind>().map_err(|_| {
                SecretError::MalformedRecord(format!("unknown provider '{name}'"))
            })?,
            Some(other) => {
                return Err(SecretError::MalformedRecord(format!(
                    "provider selector is not a string: {other}"
                )))
            }
        };

        match self.kv.get(&provider.record_key()).await? {
            None => Ok(None),
            Some(Value::String(value)) if !value.is_empty() => {
                Ok(Some((provider, EncryptedSecretRecord::from_base64(value))))
            }
            Some(Value::String(_)) => Err(SecretError::MalformedRecord(
                "stored record is empty".to_string(),
            )),
            Some(_) => Err(SecretError::MalformedRecord(
                "stored record is not a string".to_string(),
            )),
        }
    }

    /// Whether a credential record is stored.
    pub async fn has_key(&self) -> Result<bool> {
        Ok(self.load().await?.is_some())
    }

    /// Remove every credential record and the provider selector.
    ///
    /// Other application keys and the salt are left alone.
    pub async fn clear(&self) -> Result<()> {
        let mut keys: Vec<String> = ProviderKind::ALL.iter().map(|p| p.record_key()).collect();
        keys.push(PROVIDER_KEY.to_string());
        self.kv.remove(&keys).await?;
        debug!("cleared stored credentials");
        Ok(())
    }

    /// The installation salt, generated and persisted on first use.
    ///
    /// Racing first calls agree on a single salt.
    pub async fn salt(&self) -> Result<Salt> {
        if let Some(stored) = self.kv.get(SALT_KEY).await? {
            return parse_salt(&stored);
        }

        let candidate = Salt::generate()?.to_hex();
        let stored = self
            .kv
            .get_or_insert(SALT_KEY, Value::String(candidate.clone()))
            .await?;
        if stored.as_str() == Some(candidate.as_str()) {
            info!("generated new installation salt");
        }
        parse_salt(&stored)
    }
}

fn parse_salt(value: &Value) -> Result<Salt> {
    match value {
        Value::String(hex) => Salt::from_hex(hex),
        _ => Err(SecretError::MalformedRecord(
            "stored salt is not a string".to_string(),
        )),
    }
}
