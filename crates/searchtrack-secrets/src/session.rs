//! In-memory cache of the unlocked credential.
//!
//! The cache forgets its secret once no qualifying activity has been seen for
//! the inactivity timeout. Expiry is checked lazily on every read; owners
//! that want to react at the exact moment (for example to broadcast a lock
//! event) can sleep until [`SessionCache::deadline`] and call
//! [`SessionCache::expire_if_due`].

use std::time::Duration;

use searchtrack_core::{ProviderKind, SecretString};
use tokio::time::Instant;
use tracing::debug;

use crate::types::SessionSecret;

/// Inactivity timeout used when none is configured.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Stand-in deadline for timeouts too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug)]
pub struct SessionCache {
    timeout: Duration,
    entry: Option<SessionSecret>,
    deadline: Option<Instant>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(DEFAULT_INACTIVITY_TIMEOUT)
    }
}

impl SessionCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            entry: None,
            deadline: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Store the unlocked secret and start the inactivity timer.
    ///
    /// Replaces any previous secret.
    pub fn set(&mut self, api_key: SecretString, provider: ProviderKind) {
        self.entry = Some(SessionSecret::new(api_key, provider));
        self.deadline = Some(self.next_deadline());
        debug!(%provider, timeout_secs = self.timeout.as_secs(), "session unlocked");
    }

    /// The cached secret, or `None` if never set, cleared, or expired.
    ///
    /// Reading does not extend the session.
    pub fn get(&mut self) -> Option<SessionSecret> {
        self.expire_if_due();
        self.entry.clone()
    }

    /// Record qualifying user activity. Returns `false` when there is no
    /// live session to extend.
    pub fn touch(&mut self) -> bool {
        self.expire_if_due();
        if self.entry.is_none() {
            return false;
        }
        self.deadline = Some(self.next_deadline());
        true
    }

    fn next_deadline(&self) -> Instant {
        let now = Instant::now();
        now.checked_add(self.timeout)
            .unwrap_or_else(|| now + FAR_FUTURE)
    }

    /// Drop the secret. Returns the provider it belonged to, if any.
    pub fn clear(&mut self) -> Option<ProviderKind> {
        self.deadline = None;
        self.entry.take().map(|secret| secret.provider)
    }

    /// Clear the secret if its deadline has passed.
    ///
    /// Returns the provider of the expired secret.
    pub fn expire_if_due(&mut self) -> Option<ProviderKind> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                let provider = self.clear();
                if let Some(provider) = provider {
                    debug!(%provider, "session expired after inactivity");
                }
                provider
            }
            _ => None,
        }
    }

    /// When the current secret will expire, if one is held.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_unlocked(&self) -> bool {
        match (&self.entry, self.deadline) {
            (Some(_), Some(deadline)) => Instant::now() < deadline,
            _ => false,
        }
    }
}
