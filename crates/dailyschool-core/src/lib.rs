//! Daily School core library.
//!
//! Token storage, the authenticated API client with silent token refresh,
//! the auth session, and the in-memory announcement board shared by the
//! front-ends.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;
pub mod news;

pub use api::{ApiClient, ApiError, RetryPolicy};
pub use auth::{AuthSession, KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use config::{Config, SessionRestore};
pub use context::{AppContext, ContextError};
