//! Background coordination for SearchTrack.
//!
//! This crate provides:
//! - The tagged-union message catalogue surfaces and the coordinator exchange
//! - A dispatch table routing each action to its handler
//! - The coordinator task owning the session copy of the API key
//! - Broadcast of unlock, change, lock, and health events
//! - [`SurfaceContext`], the client side used by popups, tabs, and the CLI

pub mod context;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod health;
pub mod messages;
pub mod methods;
pub mod notifier;

pub use context::SurfaceContext;
pub use coordinator::{Coordinator, CoordinatorBuilder, CoordinatorHandle};
pub use error::GatewayError;
pub use handlers::HandlerContext;
pub use messages::{
    Action, Event, Request, Response, SessionKeyResponse, StoreApiKeyResponse, StoredKeyStatus,
};
pub use methods::{MethodHandler, MethodRegistry};
pub use notifier::Notifier;

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
