//! Password-locked storage against a real storage file.

use searchtrack_core::{ProviderKind, SecretString};
use searchtrack_secrets::store::{PROVIDER_KEY, SALT_KEY};
use searchtrack_secrets::{FileKeyValueStore, KeyValueStore, SecretError, SecureStorage};
use tempfile::TempDir;

const PASSWORD: &str = "correct horse battery staple";

async fn unlocked(dir: &TempDir, password: &str) -> SecureStorage<FileKeyValueStore> {
    let mut storage = SecureStorage::new(FileKeyValueStore::new(dir.path().join("storage.json")));
    storage
        .initialize(SecretString::new(password))
        .await
        .unwrap();
    storage
}

#[tokio::test]
async fn test_store_and_unlock_across_restarts() {
    let dir = TempDir::new().unwrap();

    let storage = unlocked(&dir, PASSWORD).await;
    storage
        .store_api_key(ProviderKind::OpenAi, &SecretString::new("sk-test-123"))
        .await
        .unwrap();
    drop(storage);

    // The file holds ciphertext only.
    let raw = std::fs::read_to_string(dir.path().join("storage.json")).unwrap();
    assert!(!raw.contains("sk-test-123"));
    assert!(raw.contains("encrypted_openai_key"));

    // A fresh process with the same password gets the key back.
    let storage = unlocked(&dir, PASSWORD).await;
    let (provider, key) = storage.api_key().await.unwrap().unwrap();
    assert_eq!(provider, ProviderKind::OpenAi);
    assert_eq!(key.expose_secret(), "sk-test-123");
}

#[tokio::test]
async fn test_wrong_password_leaves_record_intact() {
    let dir = TempDir::new().unwrap();

    let storage = unlocked(&dir, PASSWORD).await;
    storage
        .store_api_key(ProviderKind::OpenAi, &SecretString::new("sk-test-123"))
        .await
        .unwrap();
    let before = std::fs::read_to_string(dir.path().join("storage.json")).unwrap();

    let wrong = unlocked(&dir, "wrong").await;
    let err = wrong.api_key().await.unwrap_err();
    assert!(matches!(err, SecretError::Authentication));

    let after = std::fs::read_to_string(dir.path().join("storage.json")).unwrap();
    assert_eq!(before, after);

    let storage = unlocked(&dir, PASSWORD).await;
    assert_eq!(
        storage.api_key().await.unwrap().unwrap().1.expose_secret(),
        "sk-test-123"
    );
}

#[tokio::test]
async fn test_switching_provider_replaces_record() {
    let dir = TempDir::new().unwrap();
    let storage = unlocked(&dir, PASSWORD).await;

    storage
        .store_api_key(ProviderKind::OpenAi, &SecretString::new("sk-old"))
        .await
        .unwrap();
    storage
        .store_api_key(ProviderKind::Anthropic, &SecretString::new("sk-ant-new"))
        .await
        .unwrap();

    let kv = storage.store().backend();
    assert!(kv.get("encrypted_openai_key").await.unwrap().is_none());
    assert_eq!(
        kv.get(PROVIDER_KEY).await.unwrap(),
        Some(serde_json::json!("anthropic"))
    );

    let (provider, key) = storage.api_key().await.unwrap().unwrap();
    assert_eq!(provider, ProviderKind::Anthropic);
    assert_eq!(key.expose_secret(), "sk-ant-new");
}

#[tokio::test]
async fn test_clear_keeps_salt_and_app_keys() {
    let dir = TempDir::new().unwrap();
    let storage = unlocked(&dir, PASSWORD).await;
    let kv = storage.store().backend();

    kv.set(vec![("settings".to_string(), serde_json::json!({"theme": "dark"}))])
        .await
        .unwrap();
    storage
        .store_api_key(ProviderKind::Cohere, &SecretString::new("co-key"))
        .await
        .unwrap();
    let salt = kv.get(SALT_KEY).await.unwrap();
    assert!(salt.is_some());

    storage.clear_all().await.unwrap();

    assert!(!storage.has_stored_key().await.unwrap());
    assert!(storage.api_key().await.unwrap().is_none());
    assert_eq!(kv.get(SALT_KEY).await.unwrap(), salt);
    assert!(kv.get("settings").await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_racing_saves_from_separate_handles_keep_one_record() {
    let dir = TempDir::new().unwrap();
    // Separate instances share no in-process lock, like two processes.
    let cli = unlocked(&dir, PASSWORD).await;
    let background = unlocked(&dir, PASSWORD).await;

    let openai = SecretString::new("sk-openai");
    let anthropic = SecretString::new("sk-ant");
    let (a, b) = tokio::join!(
        cli.store_api_key(ProviderKind::OpenAi, &openai),
        background.store_api_key(ProviderKind::Anthropic, &anthropic),
    );
    a.unwrap();
    b.unwrap();

    let keys = cli.store().backend().keys().await.unwrap();
    let records: Vec<_> = keys.iter().filter(|k| k.starts_with("encrypted_")).collect();
    assert_eq!(records.len(), 1);

    let (provider, key) = cli.api_key().await.unwrap().unwrap();
    match provider {
        ProviderKind::OpenAi => assert_eq!(key.expose_secret(), "sk-openai"),
        ProviderKind::Anthropic => assert_eq!(key.expose_secret(), "sk-ant"),
        other => panic!("unexpected provider {other}"),
    }

    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}
