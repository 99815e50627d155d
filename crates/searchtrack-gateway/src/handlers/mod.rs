//! Message handlers.
//!
//! One handler per [`Action`]; all share a [`HandlerContext`] owned by the
//! coordinator.

pub mod notify;
pub mod session;
pub mod status;

use crate::health::HealthSchedule;
use crate::messages::Action;
use crate::methods::MethodRegistry;
use crate::notifier::Notifier;
use searchtrack_providers::{CredentialValidator, NoopValidator};
use searchtrack_secrets::{KeyValueStore, MemoryKeyValueStore, SecretStore, SessionCache};
use std::sync::Arc;
use tokio::sync::Mutex;

pub use notify::{ApiKeyChangedHandler, ApiKeyUnlockedHandler};
pub use session::{ClearApiKeyHandler, SessionKeyHandler, StoreApiKeyHandler, UserActivityHandler};
pub use status::StoredKeyStatusHandler;

/// Register all built-in handlers.
pub async fn register_all(registry: &MethodRegistry, ctx: Arc<HandlerContext>) {
    // Session methods
    registry
        .register(
            Action::StoreApiKeyInBackground,
            Arc::new(StoreApiKeyHandler::new(ctx.clone())),
        )
        .await;
    registry
        .register(
            Action::GetApiKeyForSession,
            Arc::new(SessionKeyHandler::new(ctx.clone())),
        )
        .await;
    registry
        .register(
            Action::UserActivity,
            Arc::new(UserActivityHandler::new(ctx.clone())),
        )
        .await;
    registry
        .register(
            Action::ClearApiKey,
            Arc::new(ClearApiKeyHandler::new(ctx.clone())),
        )
        .await;

    // Status
    registry
        .register(
            Action::GetStoredApiKey,
            Arc::new(StoredKeyStatusHandler::new(ctx.clone())),
        )
        .await;

    // Notifications
    registry
        .register(
            Action::ApiKeyUnlocked,
            Arc::new(ApiKeyUnlockedHandler::new(ctx.clone())),
        )
        .await;
    registry
        .register(
            Action::ApiKeyChanged,
            Arc::new(ApiKeyChangedHandler::new(ctx)),
        )
        .await;
}

/// State shared by every handler.
pub struct HandlerContext {
    /// Authoritative session copy of the key.
    pub session: Mutex<SessionCache>,

    /// Durable encrypted record, read for status queries only.
    pub store: SecretStore<Arc<dyn KeyValueStore>>,

    /// Event fan-out to surfaces.
    pub notifier: Notifier,

    /// Used by the periodic health check.
    pub validator: Arc<dyn CredentialValidator>,

    /// Next health check.
    pub health: Mutex<HealthSchedule>,
}

impl Default for HandlerContext {
    fn default() -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        Self {
            session: Mutex::new(SessionCache::default()),
            store: SecretStore::new(kv),
            notifier: Notifier::default(),
            validator: Arc::new(NoopValidator),
            health: Mutex::new(HealthSchedule::new(Some(
                crate::health::DEFAULT_HEALTH_INTERVAL,
            ))),
        }
    }
}

impl HandlerContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Error for a request routed to the wrong handler.
pub(crate) fn mismatched(expected: Action) -> crate::error::GatewayError {
    crate::error::GatewayError::InvalidParams(format!("handler expects {expected}"))
}
