//! Remote LLM provider selector.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The remote API a stored credential authenticates against.
///
/// Stored unencrypted next to the encrypted record and carried in every
/// unlock/changed message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Cohere,
    Mistral,
}

impl ProviderKind {
    /// Every supported provider, in selector order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Cohere,
        ProviderKind::Mistral,
    ];

    /// Lowercase identifier used in storage keys and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Cohere => "cohere",
            Self::Mistral => "mistral",
        }
    }

    /// Human-friendly name for status lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic (Claude)",
            Self::Cohere => "Cohere",
            Self::Mistral => "Mistral AI",
        }
    }

    /// Durable-store key holding this provider's encrypted record.
    pub fn record_key(&self) -> String {
        format!("encrypted_{}_key", self.as_str())
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "cohere" => Ok(Self::Cohere),
            "mistral" => Ok(Self::Mistral),
            other => Err(Error::UnknownProvider(other.to_string())),
        }
    }
}
