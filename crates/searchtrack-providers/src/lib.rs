//! Remote provider calls for SearchTrack.
//!
//! - [`validation`]: checking an API key against the provider's model listing
//!   endpoint, used before saving a key and by the daily health check.
//! - [`refine`]: rewriting a search query through an OpenAI chat completion.
//!
//! # Example
//!
//! ```rust,ignore
//! use searchtrack_core::{ProviderKind, SecretString};
//! use searchtrack_providers::{CredentialValidator, HttpValidator};
//!
//! let validator = HttpValidator::new()?;
//! validator
//!     .validate(ProviderKind::OpenAi, &SecretString::new("sk-..."))
//!     .await?;
//! ```

mod error;
pub mod refine;
pub mod validation;

pub use error::{ProviderError, Result};
pub use refine::QueryRefiner;
pub use validation::{CredentialValidator, HttpValidator, NoopValidator};
