//! Surfaces, coordinator and encrypted storage working together.

use searchtrack_core::{ProviderKind, SecretString};
use searchtrack_gateway::{Coordinator, Event, SurfaceContext};
use searchtrack_secrets::{KeyValueStore, MemoryKeyValueStore, SecureStorage};
use std::sync::Arc;
use std::time::Duration;

const PASSWORD: &str = "correct horse battery staple";

/// Save `api_key` under `PASSWORD` and return the unlocked storage.
async fn saved(kv: Arc<MemoryKeyValueStore>, api_key: &str) -> SecureStorage<Arc<MemoryKeyValueStore>> {
    let mut storage = SecureStorage::new(kv);
    storage
        .initialize(SecretString::new(PASSWORD))
        .await
        .unwrap();
    storage
        .store_api_key(ProviderKind::OpenAi, &SecretString::new(api_key))
        .await
        .unwrap();
    storage
}

#[tokio::test]
async fn test_unlock_reaches_every_surface() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let storage = saved(kv.clone(), "sk-test-123").await;
    let shared: Arc<dyn KeyValueStore> = kv;

    let (handle, _task) = Coordinator::builder().store(shared).build().await.spawn();
    let mut popup = SurfaceContext::new("popup", handle.clone());
    let mut tab = SurfaceContext::new("tab", handle.clone());

    // Locked: the tab sees a stored but locked key.
    assert!(tab.api_key().await.unwrap().is_none());
    assert!(tab.stored_key_status().await.unwrap().has_key);

    let (provider, api_key) = storage.api_key().await.unwrap().unwrap();
    popup.unlock(api_key, provider).await.unwrap();

    // The broadcast is best-effort; request/response is authoritative.
    assert_eq!(
        tab.api_key().await.unwrap().unwrap().expose_secret(),
        "sk-test-123"
    );

    // A late surface never saw the broadcast and still converges.
    let mut late = SurfaceContext::new("late", handle);
    assert_eq!(
        late.api_key().await.unwrap().unwrap().expose_secret(),
        "sk-test-123"
    );
}

#[tokio::test]
async fn test_concurrent_saves_last_write_wins() {
    let (handle, _task) = Coordinator::builder().build().await.spawn();

    let first = handle.store_api_key(SecretString::new("sk-first"), ProviderKind::OpenAi);
    let second = handle.store_api_key(SecretString::new("sk-second"), ProviderKind::OpenAi);
    let (a, b) = tokio::join!(first, second);
    assert!(a.unwrap() && b.unwrap());

    let key = handle.session_api_key().await.unwrap().unwrap();
    assert!(["sk-first", "sk-second"].contains(&key.expose_secret()));

    handle
        .store_api_key(SecretString::new("sk-third"), ProviderKind::OpenAi)
        .await
        .unwrap();
    assert_eq!(
        handle.session_api_key().await.unwrap().unwrap().expose_secret(),
        "sk-third"
    );
}

#[tokio::test]
async fn test_inactivity_lock_keeps_durable_record() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let storage = saved(kv.clone(), "sk-test-123").await;
    let (provider, api_key) = storage.api_key().await.unwrap().unwrap();
    let shared: Arc<dyn KeyValueStore> = kv.clone();

    // Key derivation above runs on the blocking pool; only the timer part is
    // driven by paused time.
    tokio::time::pause();

    let (handle, _task) = Coordinator::builder()
        .store(shared)
        .inactivity_timeout(Duration::from_secs(30 * 60))
        .health_check_interval(None)
        .build()
        .await
        .spawn();
    let mut popup = SurfaceContext::new("popup", handle.clone());
    let mut tab = SurfaceContext::new("tab", handle.clone());

    popup.unlock(api_key, provider).await.unwrap();
    assert!(tab.api_key().await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(20 * 60)).await;
    tab.activity().await.unwrap();
    // Round trip so the activity is processed before the clock moves.
    tab.stored_key_status().await.unwrap();
    tokio::time::advance(Duration::from_secs(20 * 60)).await;
    assert!(handle.session_api_key().await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(31 * 60)).await;
    loop {
        match popup.next_event().await {
            Some(Event::ApiKeyLocked { provider }) => {
                assert_eq!(provider, ProviderKind::OpenAi);
                break;
            }
            Some(_) => continue,
            None => panic!("coordinator stopped"),
        }
    }
    assert!(popup.cached().is_none());
    assert!(tab.api_key().await.unwrap().is_none());

    // The encrypted record survives and still unlocks with the password.
    assert!(tab.stored_key_status().await.unwrap().has_key);
    assert_eq!(
        storage.api_key().await.unwrap().unwrap().1.expose_secret(),
        "sk-test-123"
    );
}

#[tokio::test]
async fn test_json_messages_end_to_end() {
    let (handle, _task) = Coordinator::builder().build().await.spawn();

    let reply = handle
        .call_json(serde_json::json!({
            "action": "storeApiKeyInBackground",
            "apiKey": "sk-test-123",
            "provider": "openai",
        }))
        .await
        .unwrap();
    assert_eq!(reply, serde_json::json!({ "success": true }));

    let reply = handle
        .call_json(serde_json::json!({ "action": "getApiKeyForSession" }))
        .await
        .unwrap();
    assert_eq!(reply, serde_json::json!({ "apiKey": "sk-test-123" }));

    let reply = handle
        .call_json(serde_json::json!({ "action": "getStoredApiKey" }))
        .await
        .unwrap();
    assert_eq!(
        reply,
        serde_json::json!({ "hasKey": false, "status": "success" })
    );

    let unknown = handle
        .call_json(serde_json::json!({ "action": "openTab" }))
        .await;
    assert!(unknown.is_err());
}
