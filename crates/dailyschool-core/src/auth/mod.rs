//! Authentication module for managing tokens and the signed-in user.
//!
//! This module provides:
//! - `TokenStore`: access/refresh token persistence (keychain or memory)
//! - `AuthSession`: the current user and the authenticated flag

pub mod credentials;
pub mod session;

pub use credentials::{KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use session::AuthSession;
