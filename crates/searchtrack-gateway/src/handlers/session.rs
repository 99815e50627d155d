//! Session cache handlers.

use super::{mismatched, HandlerContext};
use crate::error::GatewayError;
use crate::messages::{Action, Event, Request, Response, SessionKeyResponse, StoreApiKeyResponse};
use crate::methods::MethodHandler;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// `storeApiKeyInBackground`: cache the unlocked key for this session.
pub struct StoreApiKeyHandler {
    context: Arc<HandlerContext>,
}

impl StoreApiKeyHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for StoreApiKeyHandler {
    async fn call(&self, request: Request) -> Result<Response> {
        let Request::StoreApiKeyInBackground { api_key, provider } = request else {
            return Err(mismatched(Action::StoreApiKeyInBackground));
        };
        if api_key.is_empty() {
            return Err(GatewayError::InvalidParams(
                "apiKey must not be empty".to_string(),
            ));
        }

        self.context.session.lock().await.set(api_key, provider);
        info!(%provider, "API key cached for session");

        Ok(Response::StoreApiKey(StoreApiKeyResponse { success: true }))
    }
}

/// `getApiKeyForSession`: hand out the session copy, if any.
pub struct SessionKeyHandler {
    context: Arc<HandlerContext>,
}

impl SessionKeyHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for SessionKeyHandler {
    async fn call(&self, _request: Request) -> Result<Response> {
        let secret = self.context.session.lock().await.get();
        debug!(unlocked = secret.is_some(), "session key requested");
        Ok(Response::SessionKey(SessionKeyResponse {
            api_key: secret.map(|s| s.api_key),
        }))
    }
}

/// `userActivity`: push the inactivity deadline back.
pub struct UserActivityHandler {
    context: Arc<HandlerContext>,
}

impl UserActivityHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for UserActivityHandler {
    async fn call(&self, _request: Request) -> Result<Response> {
        self.context.session.lock().await.touch();
        Ok(Response::Ack)
    }
}

/// `clearApiKey`: drop the session copy and tell every surface.
pub struct ClearApiKeyHandler {
    context: Arc<HandlerContext>,
}

impl ClearApiKeyHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for ClearApiKeyHandler {
    async fn call(&self, _request: Request) -> Result<Response> {
        let cleared = self.context.session.lock().await.clear();
        self.context.health.lock().await.disarm();

        if let Some(provider) = cleared {
            info!(%provider, "session API key cleared");
            self.context.notifier.publish(Event::ApiKeyLocked { provider });
        }
        Ok(Response::Ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchtrack_core::{ProviderKind, SecretString};

    fn store_request(key: &str) -> Request {
        Request::StoreApiKeyInBackground {
            api_key: SecretString::new(key),
            provider: ProviderKind::OpenAi,
        }
    }

    #[tokio::test]
    async fn test_store_then_get() {
        let ctx = Arc::new(HandlerContext::new());
        let response = StoreApiKeyHandler::new(ctx.clone())
            .call(store_request("sk-test-123"))
            .await
            .unwrap();
        assert_eq!(
            response,
            Response::StoreApiKey(StoreApiKeyResponse { success: true })
        );

        let response = SessionKeyHandler::new(ctx)
            .call(Request::GetApiKeyForSession)
            .await
            .unwrap();
        assert_eq!(
            response,
            Response::SessionKey(SessionKeyResponse {
                api_key: Some(SecretString::new("sk-test-123"))
            })
        );
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let ctx = Arc::new(HandlerContext::new());
        let err = StoreApiKeyHandler::new(ctx.clone())
            .call(store_request(""))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParams(_)));
        assert!(ctx.session.lock().await.get().is_none());
    }

    #[tokio::test]
    async fn test_wrong_request_rejected() {
        let ctx = Arc::new(HandlerContext::new());
        let err = StoreApiKeyHandler::new(ctx)
            .call(Request::GetApiKeyForSession)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_clear_broadcasts_locked() {
        let ctx = Arc::new(HandlerContext::new());
        let mut events = ctx.notifier.subscribe();
        StoreApiKeyHandler::new(ctx.clone())
            .call(store_request("sk-test-123"))
            .await
            .unwrap();

        ClearApiKeyHandler::new(ctx.clone())
            .call(Request::ClearApiKey)
            .await
            .unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            Event::ApiKeyLocked {
                provider: ProviderKind::OpenAi
            }
        );

        // Nothing left to clear, nothing broadcast.
        ClearApiKeyHandler::new(ctx)
            .call(Request::ClearApiKey)
            .await
            .unwrap();
        assert!(events.try_recv().is_err());
    }
}
