//! REST API client module for the Daily School service.
//!
//! This module provides the `ApiClient` for signing up, signing in and
//! publishing announcements. Authorized calls carry a bearer access token;
//! an expired token is refreshed once per request using the stored refresh
//! token.

pub mod client;
pub mod error;

pub use client::{ApiClient, RetryPolicy};
pub use error::ApiError;
