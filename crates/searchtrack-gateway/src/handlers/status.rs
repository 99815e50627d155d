//! Stored-key status handler.

use super::HandlerContext;
use crate::messages::{Request, Response, StoredKeyStatus};
use crate::methods::MethodHandler;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// `getStoredApiKey`: report whether an encrypted key exists.
///
/// Storage failures are reported in the reply body rather than as an error.
pub struct StoredKeyStatusHandler {
    context: Arc<HandlerContext>,
}

impl StoredKeyStatusHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for StoredKeyStatusHandler {
    async fn call(&self, _request: Request) -> Result<Response> {
        let status = match self.context.store.has_key().await {
            Ok(has_key) => StoredKeyStatus::success(has_key),
            Err(e) => {
                warn!(error = %e, "could not read stored API key");
                StoredKeyStatus::error(e.to_string())
            }
        };
        Ok(Response::StoredKey(status))
    }
}
