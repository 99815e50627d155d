//! Periodic check that the unlocked key is still accepted by its provider.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::handlers::HandlerContext;
use crate::messages::Event;

/// Default spacing between health checks.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// When the next health check is due.
///
/// Armed on unlock; an unarmed schedule never fires.
#[derive(Debug)]
pub struct HealthSchedule {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl HealthSchedule {
    /// `None` disables health checks entirely.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Schedule the next check one interval from now, replacing any pending
    /// one. Returns `false` when checks are disabled or the interval is too
    /// large to schedule.
    pub fn arm(&mut self) -> bool {
        self.next = self
            .interval
            .and_then(|interval| Instant::now().checked_add(interval));
        self.next.is_some()
    }

    pub fn disarm(&mut self) {
        self.next = None;
    }

    pub fn next(&self) -> Option<Instant> {
        self.next
    }
}

/// Validate the session key against its provider.
///
/// A rejection drops the session copy and broadcasts a warning. Network
/// trouble is only logged. The stored record is never touched.
pub async fn run_health_check(ctx: Arc<HandlerContext>) {
    let Some(secret) = ctx.session.lock().await.get() else {
        debug!("no unlocked key, skipping health check");
        return;
    };
    let provider = secret.provider;

    match ctx.validator.validate(provider, &secret.api_key).await {
        Ok(()) => info!(%provider, "API key health check passed"),
        Err(e) if e.is_rejection() => {
            warn!(%provider, error = %e, "API key health check failed");

            {
                let mut session = ctx.session.lock().await;
                let unchanged = session
                    .get()
                    .is_some_and(|current| current.api_key == secret.api_key);
                if unchanged {
                    session.clear();
                }
            }

            ctx.notifier.publish(Event::ApiKeyHealthWarning {
                provider,
                message: e.user_message(),
            });
        }
        Err(e) => warn!(%provider, error = %e, "API key health check could not reach provider"),
    }
}
