//! The background coordinator.
//!
//! A single task that owns the authoritative session cache. Surfaces reach it
//! through a [`CoordinatorHandle`]: requests travel over an mpsc queue with a
//! oneshot reply, and lifecycle events come back over the [`Notifier`]. The
//! task handles one message at a time, so concurrent saves resolve in
//! arrival order (last write wins).

use std::sync::Arc;
use std::time::Duration;

use searchtrack_core::{Config, ProviderKind, SecretString};
use searchtrack_providers::CredentialValidator;
use searchtrack_secrets::session::DEFAULT_INACTIVITY_TIMEOUT;
use searchtrack_secrets::{KeyValueStore, MemoryKeyValueStore, SecretStore, SessionCache};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::handlers::{self, HandlerContext};
use crate::health::{run_health_check, HealthSchedule, DEFAULT_HEALTH_INTERVAL};
use crate::messages::{Action, Event, Request, Response, StoredKeyStatus};
use crate::methods::MethodRegistry;
use crate::notifier::{Notifier, DEFAULT_CAPACITY};
use crate::Result;

/// A queued request plus where to send the answer.
struct Envelope {
    request: Request,
    reply: Option<oneshot::Sender<Result<Response>>>,
}

/// Builder for [`Coordinator`].
pub struct CoordinatorBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    validator: Option<Arc<dyn CredentialValidator>>,
    inactivity_timeout: Duration,
    health_interval: Option<Duration>,
    queue_capacity: usize,
    event_capacity: usize,
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self {
            store: None,
            validator: None,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            health_interval: Some(DEFAULT_HEALTH_INTERVAL),
            queue_capacity: 32,
            event_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CoordinatorBuilder {
    /// Durable store consulted by `getStoredApiKey`. Defaults to an
    /// in-memory store.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validator used by the health check. Defaults to
    /// [`searchtrack_providers::NoopValidator`].
    pub fn validator(mut self, validator: Arc<dyn CredentialValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    /// `None` disables the health check.
    pub fn health_check_interval(mut self, interval: Option<Duration>) -> Self {
        self.health_interval = interval;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Apply session and health check settings from `config`.
    ///
    /// The config is validated first; out-of-range values are rejected.
    pub fn config(self, config: &Config) -> Result<Self> {
        config.validate()?;
        let interval = config
            .health_check
            .enabled
            .then(|| config.health_check.interval());
        Ok(self
            .inactivity_timeout(config.session.inactivity_timeout())
            .health_check_interval(interval))
    }

    pub async fn build(self) -> Coordinator {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryKeyValueStore::new()));
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(searchtrack_providers::NoopValidator));
        let notifier = Notifier::new(self.event_capacity);

        let context = Arc::new(HandlerContext {
            session: Mutex::new(SessionCache::new(self.inactivity_timeout)),
            store: SecretStore::new(store),
            notifier: notifier.clone(),
            validator,
            health: Mutex::new(HealthSchedule::new(self.health_interval)),
        });

        let registry = MethodRegistry::new();
        handlers::register_all(&registry, context.clone()).await;

        let (tx, rx) = mpsc::channel(self.queue_capacity.max(1));

        Coordinator {
            context,
            registry,
            rx,
            handle: CoordinatorHandle { tx, notifier },
        }
    }
}

/// Owner of the session cache and dispatcher of surface messages.
pub struct Coordinator {
    context: Arc<HandlerContext>,
    registry: MethodRegistry,
    rx: mpsc::Receiver<Envelope>,
    handle: CoordinatorHandle,
}

impl Coordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Run on a new task.
    pub fn spawn(self) -> (CoordinatorHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }

    /// Process messages until every handle is dropped.
    ///
    /// The session copy does not outlive this call.
    pub async fn run(self) {
        let Self {
            context,
            registry,
            mut rx,
            handle,
        } = self;
        drop(handle);

        info!("coordinator started");

        loop {
            let session_deadline = context.session.lock().await.deadline();
            let health_deadline = context.health.lock().await.next();

            tokio::select! {
                envelope = rx.recv() => {
                    let Some(envelope) = envelope else { break };
                    dispatch(&registry, envelope).await;
                }
                _ = sleep_until_opt(session_deadline) => {
                    let expired = context.session.lock().await.expire_if_due();
                    if let Some(provider) = expired {
                        context.health.lock().await.disarm();
                        info!(%provider, "API key cleared due to inactivity");
                        context.notifier.publish(Event::ApiKeyLocked { provider });
                    }
                }
                _ = sleep_until_opt(health_deadline) => {
                    context.health.lock().await.arm();
                    tokio::spawn(run_health_check(context.clone()));
                }
            }
        }

        context.session.lock().await.clear();
        info!("coordinator stopped");
    }
}

async fn dispatch(registry: &MethodRegistry, envelope: Envelope) {
    let Envelope { request, reply } = envelope;
    let action = request.action();
    let result = registry.call(request).await;

    match reply {
        Some(reply) => {
            if reply.send(result).is_err() {
                debug!(%action, "requester went away before the reply");
            }
        }
        None => {
            if let Err(e) = result {
                warn!(%action, error = %e, "message failed");
            }
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Cloneable sender side of the coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Envelope>,
    notifier: Notifier,
}

impl CoordinatorHandle {
    /// Send `request` and wait for the reply.
    pub async fn request(&self, request: Request) -> Result<Response> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                request,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| GatewayError::CoordinatorClosed)?;
        reply_rx.await.map_err(|_| GatewayError::CoordinatorClosed)?
    }

    /// Send `request` without waiting for it to be handled.
    pub async fn send(&self, request: Request) -> Result<()> {
        self.tx
            .send(Envelope {
                request,
                reply: None,
            })
            .await
            .map_err(|_| GatewayError::CoordinatorClosed)
    }

    /// Handle a raw JSON message and return the JSON reply.
    pub async fn call_json(&self, message: serde_json::Value) -> Result<serde_json::Value> {
        let request: Request = serde_json::from_value(message)?;
        let response = self.request(request).await?;
        Ok(serde_json::to_value(response)?)
    }

    /// Listen for lifecycle events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.notifier.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// `storeApiKeyInBackground`.
    pub async fn store_api_key(&self, api_key: SecretString, provider: ProviderKind) -> Result<bool> {
        match self
            .request(Request::StoreApiKeyInBackground { api_key, provider })
            .await?
        {
            Response::StoreApiKey(response) => Ok(response.success),
            _ => Err(GatewayError::UnexpectedResponse(Action::StoreApiKeyInBackground)),
        }
    }

    /// `getApiKeyForSession`.
    pub async fn session_api_key(&self) -> Result<Option<SecretString>> {
        match self.request(Request::GetApiKeyForSession).await? {
            Response::SessionKey(response) => Ok(response.api_key),
            _ => Err(GatewayError::UnexpectedResponse(Action::GetApiKeyForSession)),
        }
    }

    /// `getStoredApiKey`.
    pub async fn stored_key_status(&self) -> Result<StoredKeyStatus> {
        match self.request(Request::GetStoredApiKey).await? {
            Response::StoredKey(status) => Ok(status),
            _ => Err(GatewayError::UnexpectedResponse(Action::GetStoredApiKey)),
        }
    }

    /// `apiKeyUnlocked`, fire-and-forget.
    pub async fn notify_unlocked(&self, provider: ProviderKind) -> Result<()> {
        self.send(Request::ApiKeyUnlocked { provider }).await
    }

    /// `apiKeyChanged`, fire-and-forget.
    pub async fn notify_changed(&self, provider: ProviderKind) -> Result<()> {
        self.send(Request::ApiKeyChanged {
            provider,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
        .await
    }

    /// `userActivity`, fire-and-forget.
    pub async fn user_activity(&self) -> Result<()> {
        self.send(Request::UserActivity).await
    }

    /// `clearApiKey`. Returns once the session copy is gone.
    pub async fn clear_api_key(&self) -> Result<()> {
        self.request(Request::ClearApiKey).await.map(|_| ())
    }
}
