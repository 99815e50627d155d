//! Action dispatch table.

use crate::error::GatewayError;
use crate::messages::{Action, Request, Response};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for message handlers.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Handle one request.
    async fn call(&self, request: Request) -> Result<Response>;
}

/// Registry of handlers keyed by [`Action`].
pub struct MethodRegistry {
    methods: RwLock<HashMap<Action, Arc<dyn MethodHandler>>>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self {
            methods: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler, replacing any previous one for `action`.
    pub async fn register(&self, action: Action, handler: Arc<dyn MethodHandler>) {
        let mut methods = self.methods.write().await;
        methods.insert(action, handler);
    }

    pub async fn unregister(&self, action: Action) {
        let mut methods = self.methods.write().await;
        methods.remove(&action);
    }

    /// Route `request` to its handler.
    pub async fn call(&self, request: Request) -> Result<Response> {
        let action = request.action();
        let handler = {
            let methods = self.methods.read().await;
            methods
                .get(&action)
                .cloned()
                .ok_or(GatewayError::MethodNotFound(action))?
        };

        debug!("Calling handler: {}", action);
        handler.call(request).await
    }

    /// Registered actions.
    pub async fn list(&self) -> Vec<Action> {
        let methods = self.methods.read().await;
        methods.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AckHandler;

    #[async_trait]
    impl MethodHandler for AckHandler {
        async fn call(&self, _request: Request) -> Result<Response> {
            Ok(Response::Ack)
        }
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let registry = MethodRegistry::new();
        registry
            .register(Action::UserActivity, Arc::new(AckHandler))
            .await;

        assert_eq!(
            registry.call(Request::UserActivity).await.unwrap(),
            Response::Ack
        );
        assert_eq!(registry.list().await, vec![Action::UserActivity]);
    }

    #[tokio::test]
    async fn test_missing_handler() {
        let registry = MethodRegistry::new();
        let err = registry.call(Request::ClearApiKey).await.unwrap_err();
        assert!(matches!(err, GatewayError::MethodNotFound(Action::ClearApiKey)));
        assert_eq!(err.code(), "method_not_found");
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = MethodRegistry::default();
        registry
            .register(Action::ClearApiKey, Arc::new(AckHandler))
            .await;
        registry.unregister(Action::ClearApiKey).await;
        assert!(registry.call(Request::ClearApiKey).await.is_err());
    }
}
