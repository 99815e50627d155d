//! A surface (popup, tab, CLI session) talking to the coordinator.

use searchtrack_core::{ProviderKind, SecretString};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use crate::coordinator::CoordinatorHandle;
use crate::messages::{Event, StoredKeyStatus};
use crate::Result;

/// One execution context with its own copy of the session key.
///
/// Reads are served from the local copy when present and otherwise fetched
/// from the coordinator. Unlock and change broadcasts invalidate the local
/// copy so the next read converges on the coordinator's value; lock and
/// health warnings drop it.
pub struct SurfaceContext {
    name: String,
    handle: CoordinatorHandle,
    events: Receiver<Event>,
    local: Option<SecretString>,
}

impl SurfaceContext {
    pub fn new(name: impl Into<String>, handle: CoordinatorHandle) -> Self {
        let events = handle.subscribe();
        Self {
            name: name.into(),
            handle,
            events,
            local: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local copy, without consulting the coordinator or pending events.
    pub fn cached(&self) -> Option<&SecretString> {
        self.local.as_ref()
    }

    /// Hand a freshly unlocked key to the coordinator and announce it.
    pub async fn unlock(&mut self, api_key: SecretString, provider: ProviderKind) -> Result<()> {
        self.handle.store_api_key(api_key.clone(), provider).await?;
        self.local = Some(api_key);
        self.handle.notify_unlocked(provider).await?;
        debug!(surface = %self.name, %provider, "unlocked");
        Ok(())
    }

    /// The session key, or `None` while locked.
    pub async fn api_key(&mut self) -> Result<Option<SecretString>> {
        self.drain_events();

        if let Some(key) = &self.local {
            return Ok(Some(key.clone()));
        }

        let key = self.handle.session_api_key().await?;
        if key.is_some() {
            debug!(surface = %self.name, "fetched session key from coordinator");
        }
        self.local = key.clone();
        Ok(key)
    }

    /// Apply every event received so far and return them.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut seen = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply(&event);
                    seen.push(event);
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(surface = %self.name, skipped, "missed events, dropping local key");
                    self.local = None;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        seen
    }

    /// Wait for the next event and apply it. `None` once the coordinator is
    /// gone.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    self.apply(&event);
                    return Some(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(surface = %self.name, skipped, "missed events, dropping local key");
                    self.local = None;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn apply(&mut self, event: &Event) {
        match event {
            Event::ApiKeyUnlocked { .. } | Event::ApiKeyChanged { .. } => {
                self.local = None;
            }
            Event::ApiKeyLocked { .. } | Event::ApiKeyHealthWarning { .. } => {
                if self.local.take().is_some() {
                    debug!(surface = %self.name, ?event, "local key dropped");
                }
            }
        }
    }

    /// Report qualifying user activity.
    pub async fn activity(&self) -> Result<()> {
        self.handle.user_activity().await
    }

    pub async fn stored_key_status(&self) -> Result<StoredKeyStatus> {
        self.handle.stored_key_status().await
    }

    /// Drop the key here and in the coordinator.
    pub async fn lock(&mut self) -> Result<()> {
        self.local = None;
        self.handle.clear_api_key().await
    }
}
