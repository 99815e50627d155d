//! API key validation against the provider's model listing endpoint.
//!
//! A `GET {base}/models` that returns 200 means the key is accepted. Any
//! other status is a rejection carrying the provider's own error message.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use searchtrack_core::config::ProvidersConfig;
use searchtrack_core::{ProviderKind, SecretString};
use tracing::{debug, warn};

use crate::{ProviderError, Result};

/// Message used when a rejection body carries no `error.message`.
const FALLBACK_REJECTION: &str = "API key validation failed";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Checks whether an API key is accepted by its provider.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, provider: ProviderKind, api_key: &SecretString) -> Result<()>;
}

/// Accepts every key without contacting anyone.
///
/// The default when no validator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

#[async_trait]
impl CredentialValidator for NoopValidator {
    async fn validate(&self, provider: ProviderKind, _api_key: &SecretString) -> Result<()> {
        debug!(%provider, "skipping remote validation");
        Ok(())
    }
}

/// Default API base URL for a provider.
pub fn default_base_url(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAi => "https://api.openai.com/v1",
        ProviderKind::Anthropic => "https://api.anthropic.com/v1",
        ProviderKind::Cohere => "https://api.cohere.ai/v1",
        ProviderKind::Mistral => "https://api.mistral.ai/v1",
    }
}

/// Validates keys over HTTPS.
pub struct HttpValidator {
    /// HTTP client.
    client: Client,

    /// Per-provider base URL overrides.
    base_urls: HashMap<ProviderKind, String>,
}

impl HttpValidator {
    /// Create a validator that talks to the public provider endpoints.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_urls: HashMap::new(),
        })
    }

    /// Create a validator honouring the configured timeout and base URLs.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let mut validator = Self::with_timeout(config.timeout())?;
        for provider in ProviderKind::ALL {
            if let Some(url) = config.base_url(provider) {
                validator = validator.with_base_url(provider, url);
            }
        }
        Ok(validator)
    }

    /// Point `provider` at a different API base (proxies, tests).
    pub fn with_base_url(mut self, provider: ProviderKind, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_urls
            .insert(provider, url.trim_end_matches('/').to_string());
        self
    }

    fn endpoint(&self, provider: ProviderKind) -> String {
        let base = self
            .base_urls
            .get(&provider)
            .map(String::as_str)
            .unwrap_or_else(|| default_base_url(provider));
        format!("{}/models", base)
    }

    fn headers(provider: ProviderKind, api_key: &SecretString) -> Result<HeaderMap> {
        let invalid = |_| ProviderError::config("API key contains characters not allowed in a header");

        let mut headers = HeaderMap::new();
        match provider {
            ProviderKind::Anthropic => {
                let mut key = HeaderValue::from_str(api_key.expose_secret()).map_err(invalid)?;
                key.set_sensitive(true);
                headers.insert("x-api-key", key);
                headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
            }
            ProviderKind::OpenAi | ProviderKind::Cohere | ProviderKind::Mistral => {
                let mut bearer =
                    HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                        .map_err(invalid)?;
                bearer.set_sensitive(true);
                headers.insert(AUTHORIZATION, bearer);
            }
        }
        Ok(headers)
    }
}

/// Pull `error.message` out of a provider error body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl CredentialValidator for HttpValidator {
    async fn validate(&self, provider: ProviderKind, api_key: &SecretString) -> Result<()> {
        let headers = Self::headers(provider, api_key)?;
        let url = self.endpoint(provider);
        debug!(%provider, %url, "validating API key");

        let response = self.client.get(&url).headers(headers).send().await?;

        let status = response.status();
        if status.as_u16() == 200 {
            debug!(%provider, "API key accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| FALLBACK_REJECTION.to_string());
        warn!(%provider, status = status.as_u16(), "API key rejected");
        Err(ProviderError::rejected(status.as_u16(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key() -> SecretString {
        SecretString::new("sk-test-123")
    }

    #[tokio::test]
    async fn test_noop_accepts_everything() {
        for provider in ProviderKind::ALL {
            NoopValidator.validate(provider, &key()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_openai_bearer_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("authorization", "Bearer sk-test-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let validator = HttpValidator::new()
            .unwrap()
            .with_base_url(ProviderKind::OpenAi, format!("{}/v1", server.uri()));
        validator.validate(ProviderKind::OpenAi, &key()).await.unwrap();
    }

    #[tokio::test]
    async fn test_anthropic_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("x-api-key", "sk-test-123"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let validator = HttpValidator::new()
            .unwrap()
            .with_base_url(ProviderKind::Anthropic, format!("{}/v1/", server.uri()));
        validator
            .validate(ProviderKind::Anthropic, &key())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejection_carries_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided: sk-test-***", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let validator = HttpValidator::new()
            .unwrap()
            .with_base_url(ProviderKind::Mistral, server.uri());
        let err = validator
            .validate(ProviderKind::Mistral, &key())
            .await
            .unwrap_err();

        match err {
            ProviderError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided: sk-test-***");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_without_body_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let validator = HttpValidator::new()
            .unwrap()
            .with_base_url(ProviderKind::Cohere, server.uri());
        let err = validator
            .validate(ProviderKind::Cohere, &key())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "API key validation failed");
    }

    #[tokio::test]
    async fn test_non_200_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let validator = HttpValidator::new()
            .unwrap()
            .with_base_url(ProviderKind::OpenAi, server.uri());
        let err = validator
            .validate(ProviderKind::OpenAi, &key())
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_network_failure() {
        let validator = HttpValidator::new()
            .unwrap()
            .with_base_url(ProviderKind::OpenAi, "http://127.0.0.1:1");
        let err = validator
            .validate(ProviderKind::OpenAi, &key())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[test]
    fn test_header_rejects_control_characters() {
        let result = HttpValidator::headers(ProviderKind::OpenAi, &SecretString::new("bad\nkey"));
        assert!(matches!(result, Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let mut config = ProvidersConfig::default();
        config
            .base_urls
            .insert("cohere".to_string(), "https://proxy.example.com/cohere".to_string());

        let validator = HttpValidator::from_config(&config).unwrap();
        assert_eq!(
            validator.endpoint(ProviderKind::Cohere),
            "https://proxy.example.com/cohere/models"
        );
        assert_eq!(
            validator.endpoint(ProviderKind::OpenAi),
            "https://api.openai.com/v1/models"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#),
            Some("invalid x-api-key".to_string())
        );
        assert_eq!(error_message(r#"{"error":"nope"}"#), None);
        assert_eq!(error_message("not json"), None);
    }
}
