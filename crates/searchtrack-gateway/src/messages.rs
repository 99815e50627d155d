//! Message catalogue exchanged between surfaces and the coordinator.
//!
//! Every message is a JSON object tagged by `action`, with camelCase fields:
//!
//! ```json
//! { "action": "storeApiKeyInBackground", "apiKey": "sk-...", "provider": "openai" }
//! ```

use std::fmt;

use searchtrack_core::{ProviderKind, SecretString};
use serde::{Deserialize, Serialize};

/// A message sent from a surface to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Hand the unlocked key to the coordinator's session cache.
    #[serde(rename_all = "camelCase")]
    StoreApiKeyInBackground {
        api_key: SecretString,
        #[serde(default)]
        provider: ProviderKind,
    },

    /// Ask for the session copy of the key.
    GetApiKeyForSession,

    /// Ask whether an encrypted key is stored.
    GetStoredApiKey,

    /// A surface unlocked the key.
    ApiKeyUnlocked {
        #[serde(default)]
        provider: ProviderKind,
    },

    /// A surface saved a new key.
    ApiKeyChanged {
        #[serde(default)]
        provider: ProviderKind,
        timestamp: i64,
    },

    /// Qualifying user activity; extends the session.
    UserActivity,

    /// Drop the session copy now.
    ClearApiKey,
}

impl Request {
    pub fn action(&self) -> Action {
        match self {
            Self::StoreApiKeyInBackground { .. } => Action::StoreApiKeyInBackground,
            Self::GetApiKeyForSession => Action::GetApiKeyForSession,
            Self::GetStoredApiKey => Action::GetStoredApiKey,
            Self::ApiKeyUnlocked { .. } => Action::ApiKeyUnlocked,
            Self::ApiKeyChanged { .. } => Action::ApiKeyChanged,
            Self::UserActivity => Action::UserActivity,
            Self::ClearApiKey => Action::ClearApiKey,
        }
    }
}

/// Dispatch key of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    StoreApiKeyInBackground,
    GetApiKeyForSession,
    GetStoredApiKey,
    ApiKeyUnlocked,
    ApiKeyChanged,
    UserActivity,
    ClearApiKey,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::StoreApiKeyInBackground,
        Action::GetApiKeyForSession,
        Action::GetStoredApiKey,
        Action::ApiKeyUnlocked,
        Action::ApiKeyChanged,
        Action::UserActivity,
        Action::ClearApiKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoreApiKeyInBackground => "storeApiKeyInBackground",
            Self::GetApiKeyForSession => "getApiKeyForSession",
            Self::GetStoredApiKey => "getStoredApiKey",
            Self::ApiKeyUnlocked => "apiKeyUnlocked",
            Self::ApiKeyChanged => "apiKeyChanged",
            Self::UserActivity => "userActivity",
            Self::ClearApiKey => "clearApiKey",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A broadcast from the coordinator to every subscribed surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Event {
    ApiKeyUnlocked { provider: ProviderKind },
    ApiKeyChanged { provider: ProviderKind, timestamp: i64 },
    /// The session copy was dropped (inactivity or explicit clear).
    ApiKeyLocked { provider: ProviderKind },
    /// The daily health check saw the key rejected.
    ApiKeyHealthWarning { provider: ProviderKind, message: String },
}

/// Reply to `storeApiKeyInBackground`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreApiKeyResponse {
    pub success: bool,
}

/// Reply to `getApiKeyForSession`. `apiKey` is `null` while locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKeyResponse {
    pub api_key: Option<SecretString>,
}

/// Reply to `getStoredApiKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredKeyStatus {
    pub has_key: bool,
    /// `"success"` or `"error"`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoredKeyStatus {
    pub fn success(has_key: bool) -> Self {
        Self {
            has_key,
            status: "success".to_string(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            has_key: false,
            status: "error".to_string(),
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Any reply a handler can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    StoreApiKey(StoreApiKeyResponse),
    SessionKey(SessionKeyResponse),
    StoredKey(StoredKeyStatus),
    /// Fire-and-forget messages acknowledge with `null`.
    Ack,
}
