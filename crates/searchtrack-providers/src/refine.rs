//! Search query refinement through an OpenAI chat completion.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use searchtrack_core::config::{ProvidersConfig, RefineConfig};
use searchtrack_core::{ProviderKind, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::validation::{default_base_url, error_message};
use crate::{ProviderError, Result};

const SYSTEM_PROMPT: &str = "You are a search query optimization assistant. Your job is to refine search queries to make them more effective, precise, and likely to return relevant results. Maintain the original intent but make the query clearer and more specific. Return only the refined query with no additional explanation or text.";

/// Rewrites search queries with an LLM.
///
/// Refinement is best-effort: any failure yields the original query.
pub struct QueryRefiner {
    client: Client,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl QueryRefiner {
    /// Create a refiner with the default model settings.
    pub fn new() -> Result<Self> {
        Self::from_config(&RefineConfig::default(), &ProvidersConfig::default())
    }

    pub fn from_config(refine: &RefineConfig, providers: &ProvidersConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(providers.timeout())
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {}", e)))?;

        let api_base = providers
            .base_url(ProviderKind::OpenAi)
            .unwrap_or_else(|| default_base_url(ProviderKind::OpenAi))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            api_base,
            model: refine.model.clone(),
            temperature: refine.temperature,
            max_tokens: refine.max_tokens,
        })
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Refine `query`, falling back to it unchanged on any failure.
    pub async fn refine(&self, api_key: &SecretString, query: &str) -> String {
        match self.try_refine(api_key, query).await {
            Ok(refined) => {
                debug!(original = query, refined = %refined, "query refined");
                refined
            }
            Err(e) => {
                warn!(error = %e, "query refinement failed, using original query");
                query.to_string()
            }
        }
    }

    /// Refine `query`, reporting failures.
    pub async fn try_refine(&self, api_key: &SecretString, query: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Refine this search query: \"{}\"", query),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| ProviderError::config("API key contains characters not allowed in a header"))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .headers(headers)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| "API request failed".to_string());
            return Err(ProviderError::rejected(status.as_u16(), message));
        }

        let body: ChatResponse = response.json().await?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::internal("No choices in response"))?;

        let refined = choice.message.content.unwrap_or_default().trim().to_string();
        if refined.is_empty() {
            return Err(ProviderError::internal("Empty completion"));
        }
        Ok(refined)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
