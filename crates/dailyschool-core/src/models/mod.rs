//! Data models for Daily School.
//!
//! - `ApiEnvelope`, `TokenPayload`, `RefreshPayload`: remote API wire types
//! - `SessionUser`: the signed-in identity shown by the client
//! - `NewsItem`, `NewsDraft`, `Category`: announcements

pub mod auth;
pub mod news;

pub use auth::{ApiEnvelope, RefreshPayload, SessionUser, TokenPayload};
pub use news::{Category, NewsDraft, NewsItem};
