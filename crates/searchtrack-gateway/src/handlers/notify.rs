//! Unlock and change notifications, rebroadcast to every surface.

use super::{mismatched, HandlerContext};
use crate::messages::{Action, Event, Request, Response};
use crate::methods::MethodHandler;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// `apiKeyUnlocked`: re-arm the health check and fan out the news.
///
/// Broadcasts `apiKeyUnlocked` followed by `apiKeyChanged`.
pub struct ApiKeyUnlockedHandler {
    context: Arc<HandlerContext>,
}

impl ApiKeyUnlockedHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for ApiKeyUnlockedHandler {
    async fn call(&self, request: Request) -> Result<Response> {
        let Request::ApiKeyUnlocked { provider } = request else {
            return Err(mismatched(Action::ApiKeyUnlocked));
        };

        if self.context.health.lock().await.arm() {
            debug!(%provider, "health check scheduled");
        }

        let reached = self
            .context
            .notifier
            .publish(Event::ApiKeyUnlocked { provider });
        self.context.notifier.publish(Event::ApiKeyChanged {
            provider,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
        info!(%provider, surfaces = reached, "API key unlocked");

        Ok(Response::Ack)
    }
}

/// `apiKeyChanged`: rebroadcast as-is.
pub struct ApiKeyChangedHandler {
    context: Arc<HandlerContext>,
}

impl ApiKeyChangedHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for ApiKeyChangedHandler {
    async fn call(&self, request: Request) -> Result<Response> {
        let Request::ApiKeyChanged {
            provider,
            timestamp,
        } = request
        else {
            return Err(mismatched(Action::ApiKeyChanged));
        };

        self.context
            .notifier
            .publish(Event::ApiKeyChanged { provider, timestamp });
        Ok(Response::Ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchtrack_core::ProviderKind;

    #[tokio::test(start_paused = true)]
    async fn test_unlocked_arms_health_and_broadcasts() {
        let ctx = Arc::new(HandlerContext::new());
        let mut events = ctx.notifier.subscribe();
        assert!(ctx.health.lock().await.next().is_none());

        ApiKeyUnlockedHandler::new(ctx.clone())
            .call(Request::ApiKeyUnlocked {
                provider: ProviderKind::Cohere,
            })
            .await
            .unwrap();

        assert!(ctx.health.lock().await.next().is_some());
        assert_eq!(
            events.try_recv().unwrap(),
            Event::ApiKeyUnlocked {
                provider: ProviderKind::Cohere
            }
        );
        assert!(matches!(
            events.try_recv().unwrap(),
            Event::ApiKeyChanged {
                provider: ProviderKind::Cohere,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_changed_is_rebroadcast_verbatim() {
        let ctx = Arc::new(HandlerContext::new());
        let mut events = ctx.notifier.subscribe();

        ApiKeyChangedHandler::new(ctx)
            .call(Request::ApiKeyChanged {
                provider: ProviderKind::Mistral,
                timestamp: 42,
            })
            .await
            .unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            Event::ApiKeyChanged {
                provider: ProviderKind::Mistral,
                timestamp: 42
            }
        );
    }
}
